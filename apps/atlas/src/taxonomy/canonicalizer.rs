//! Canonicalizer: resolves pending rows to canonical names.
//!
//! Flow per batch: fetch pending rows → static overrides → classifier for the remainder →
//! plan writes against the existing (original, canonical) pairs → apply in one transaction.
//!
//! Writes are planned before they are executed. A pending row whose target pair already
//! exists is deleted rather than updated, and a fan-out row whose pair already exists is
//! never inserted, so the same (original, canonical) pair can't be written twice.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AtlasError;
use crate::models::skill::{NewSkill, SkillRecord, SkillRow};
use crate::taxonomy::classifier::{CanonicalTarget, ClassifierMapping, SkillClassifier};
use crate::taxonomy::overrides::static_override;

/// Consecutive batches with nothing usable before the stage gives up.
const MAX_CONSECUTIVE_UNUSABLE: u32 = 2;
const MISMATCH_SAMPLE: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Batch resolution
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct BatchResolution {
    pub mapping: ClassifierMapping,
    pub from_overrides: usize,
    /// The classifier was needed and its call failed outright.
    pub classifier_failed: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct KeyMismatch {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

impl KeyMismatch {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compares the keys asked for with the keys the classifier answered.
pub fn key_mismatch(
    requested: &BTreeMap<String, Option<String>>,
    returned: &ClassifierMapping,
) -> KeyMismatch {
    KeyMismatch {
        missing: requested
            .keys()
            .filter(|k| !returned.contains_key(*k))
            .cloned()
            .collect(),
        extra: returned
            .keys()
            .filter(|k| !requested.contains_key(*k))
            .cloned()
            .collect(),
    }
}

/// Resolves one batch of pending rows. Overrides never reach the classifier; a classifier
/// failure is logged and leaves only the override results.
pub async fn resolve_batch(
    pending: &[SkillRecord],
    classifier: &dyn SkillClassifier,
) -> BatchResolution {
    let mut resolution = BatchResolution::default();
    let mut remainder: BTreeMap<String, Option<String>> = BTreeMap::new();

    for row in pending {
        match static_override(&row.original_skill_name) {
            Some(canonical) => {
                resolution.mapping.insert(
                    row.original_skill_name.clone(),
                    CanonicalTarget::Single(canonical.to_string()),
                );
                resolution.from_overrides += 1;
            }
            None => {
                remainder.insert(row.original_skill_name.clone(), row.category.clone());
            }
        }
    }

    if remainder.is_empty() {
        return resolution;
    }

    match classifier.canonicalize(&remainder).await {
        Ok(mut returned) => {
            let mismatch = key_mismatch(&remainder, &returned);
            if !mismatch.is_empty() {
                warn!(
                    "Key mismatch in batch: {} missing, {} extra (sample missing: {:?}, sample extra: {:?})",
                    mismatch.missing.len(),
                    mismatch.extra.len(),
                    &mismatch.missing[..mismatch.missing.len().min(MISMATCH_SAMPLE)],
                    &mismatch.extra[..mismatch.extra.len().min(MISMATCH_SAMPLE)],
                );
                for extra in &mismatch.extra {
                    returned.remove(extra);
                }
            }
            resolution.mapping.extend(returned);
        }
        Err(e) => {
            warn!("Classifier failed for a batch of {}: {e}", remainder.len());
            resolution.classifier_failed = true;
        }
    }

    resolution
}

// ────────────────────────────────────────────────────────────────────────────
// Write planning (pure)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CanonicalWritePlan {
    /// Pending row id → its first canonical name.
    pub updates: Vec<(Uuid, String)>,
    /// Pending rows made redundant by an equivalent canonical row.
    pub deletions: Vec<Uuid>,
    /// Fan-out siblings for the remaining names of a split.
    pub inserts: Vec<NewSkill>,
}

impl CanonicalWritePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.deletions.is_empty() && self.inserts.is_empty()
    }
}

/// Plans the writes for a resolved batch.
///
/// `existing` holds every (original, canonical) pair already stored for the batch's raw
/// strings. Pairs claimed earlier in the same batch count as existing too.
pub fn plan_canonical_writes(
    pending: &[SkillRecord],
    mapping: &ClassifierMapping,
    existing: &HashSet<(String, String)>,
) -> CanonicalWritePlan {
    let mut claimed = existing.clone();
    let mut plan = CanonicalWritePlan::default();

    for row in pending {
        let Some(target) = mapping.get(&row.original_skill_name) else {
            continue;
        };
        let names = target.names();
        let Some((first, rest)) = names.split_first() else {
            continue;
        };

        let original = &row.original_skill_name;
        if claimed.insert((original.clone(), first.to_string())) {
            plan.updates.push((row.id, first.to_string()));
        } else {
            plan.deletions.push(row.id);
        }

        for name in rest {
            if claimed.insert((original.clone(), name.to_string())) {
                plan.inserts.push(NewSkill {
                    original_skill_name: original.clone(),
                    canonical_skill_name: name.to_string(),
                    category: row.category.clone(),
                });
            }
        }
    }

    plan
}

// ────────────────────────────────────────────────────────────────────────────
// Stage driver
// ────────────────────────────────────────────────────────────────────────────

/// How a batch ended, as far as the termination rule is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Some mapping was written. The classifier may still have failed for the remainder.
    Applied { classifier_failed: bool },
    /// Nothing to write: the classifier failed, or answered without a usable name.
    Unusable { classifier_failed: bool },
    /// The mapping was usable but the write transaction failed.
    ApplyFailed,
}

impl BatchOutcome {
    /// `Some` when the batch is already decided before any write.
    pub fn before_apply(resolution: &BatchResolution) -> Option<Self> {
        resolution.mapping.is_empty().then_some(BatchOutcome::Unusable {
            classifier_failed: resolution.classifier_failed,
        })
    }
}

/// Which rows of the batch are left out of later fetches in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipRows {
    /// A failed call: the same rows are fetched and sent again.
    None,
    /// Rows the classifier answered without a usable name.
    Unresolved,
    /// The whole batch.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue(SkipRows),
    Stop,
}

/// Counts unusable batches in a row; a usable one resets the count.
#[derive(Debug, Default)]
pub struct Termination {
    consecutive_unusable: u32,
}

impl Termination {
    pub fn record(&mut self, outcome: BatchOutcome) -> Step {
        match outcome {
            BatchOutcome::Applied { classifier_failed } => {
                self.consecutive_unusable = 0;
                Step::Continue(if classifier_failed {
                    SkipRows::None
                } else {
                    SkipRows::Unresolved
                })
            }
            BatchOutcome::Unusable { classifier_failed } => {
                self.consecutive_unusable += 1;
                if self.consecutive_unusable >= MAX_CONSECUTIVE_UNUSABLE {
                    Step::Stop
                } else if classifier_failed {
                    Step::Continue(SkipRows::None)
                } else {
                    Step::Continue(SkipRows::Unresolved)
                }
            }
            BatchOutcome::ApplyFailed => {
                self.consecutive_unusable += 1;
                if self.consecutive_unusable >= MAX_CONSECUTIVE_UNUSABLE {
                    Step::Stop
                } else {
                    Step::Continue(SkipRows::All)
                }
            }
        }
    }

    pub fn consecutive_unusable(&self) -> u32 {
        self.consecutive_unusable
    }
}

#[derive(Debug, Default, Serialize)]
pub struct CanonicalizeSummary {
    pub batches: usize,
    pub from_overrides: usize,
    pub updated: usize,
    pub deleted: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub stopped_early: bool,
}

/// Normalize stage: drains pending rows in batches until none remain or the classifier
/// stops producing anything usable.
pub async fn canonicalize_pending(
    pool: &PgPool,
    classifier: &dyn SkillClassifier,
    batch_size: usize,
) -> Result<CanonicalizeSummary, AtlasError> {
    let mut summary = CanonicalizeSummary::default();
    // Rows not re-asked for the rest of this run.
    let mut skipped: Vec<Uuid> = Vec::new();
    let mut termination = Termination::default();

    loop {
        let batch = fetch_pending(pool, batch_size, &skipped).await?;
        if batch.is_empty() {
            info!("No more pending skills");
            break;
        }

        summary.batches += 1;
        info!("Normalizing batch {} of {} skills...", summary.batches, batch.len());

        let resolution = resolve_batch(&batch, classifier).await;
        let unresolved: Vec<Uuid> = batch
            .iter()
            .filter(|r| !resolution.mapping.contains_key(&r.original_skill_name))
            .map(|r| r.id)
            .collect();

        let outcome = match BatchOutcome::before_apply(&resolution) {
            Some(outcome) => {
                warn!("Batch {} produced nothing usable", summary.batches);
                outcome
            }
            None => match apply_batch(pool, &batch, &resolution.mapping).await {
                Ok(plan) => {
                    summary.from_overrides += resolution.from_overrides;
                    summary.updated += plan.updates.len();
                    summary.deleted += plan.deletions.len();
                    summary.inserted += plan.inserts.len();
                    info!(
                        "Batch {}: {} updated, {} redundant pending rows removed, {} split rows added",
                        summary.batches,
                        plan.updates.len(),
                        plan.deletions.len(),
                        plan.inserts.len()
                    );
                    BatchOutcome::Applied {
                        classifier_failed: resolution.classifier_failed,
                    }
                }
                Err(e) => {
                    error!("Failed to apply batch {}: {e}", summary.batches);
                    BatchOutcome::ApplyFailed
                }
            },
        };

        match termination.record(outcome) {
            Step::Stop => {
                warn!(
                    "Stopping normalization: {} unusable batches in a row",
                    termination.consecutive_unusable()
                );
                summary.stopped_early = true;
                break;
            }
            Step::Continue(SkipRows::None) => {}
            Step::Continue(SkipRows::Unresolved) => {
                if !unresolved.is_empty() {
                    warn!("{} skills left pending after batch {}", unresolved.len(), summary.batches);
                }
                summary.skipped += unresolved.len();
                skipped.extend(unresolved);
            }
            Step::Continue(SkipRows::All) => {
                summary.skipped += batch.len();
                skipped.extend(batch.iter().map(|r| r.id));
            }
        }
    }

    info!(
        "Normalization done: {} batches, {} updated ({} via overrides), {} removed, {} added, {} skipped",
        summary.batches,
        summary.updated,
        summary.from_overrides,
        summary.deleted,
        summary.inserted,
        summary.skipped
    );
    Ok(summary)
}

async fn fetch_pending(
    pool: &PgPool,
    limit: usize,
    exclude: &[Uuid],
) -> Result<Vec<SkillRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SkillRow>(
        r#"
        SELECT id, original_skill_name, canonical_skill_name, category
        FROM skills
        WHERE canonical_skill_name IS NULL
          AND NOT (id = ANY($2))
        ORDER BY original_skill_name
        LIMIT $1
        "#,
    )
    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
    .bind(exclude)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(SkillRecord::from).collect())
}

/// Phase 1 (load pairs, plan) and phase 2 (write) inside one transaction.
async fn apply_batch(
    pool: &PgPool,
    pending: &[SkillRecord],
    mapping: &ClassifierMapping,
) -> Result<CanonicalWritePlan, sqlx::Error> {
    let originals: BTreeSet<&str> = pending
        .iter()
        .map(|r| r.original_skill_name.as_str())
        .collect();
    let originals: Vec<&str> = originals.into_iter().collect();

    let mut tx = pool.begin().await?;

    let existing: HashSet<(String, String)> = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT original_skill_name, canonical_skill_name
        FROM skills
        WHERE canonical_skill_name IS NOT NULL
          AND original_skill_name = ANY($1)
        "#,
    )
    .bind(&originals)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .collect();

    let plan = plan_canonical_writes(pending, mapping, &existing);
    write_plan(&mut tx, &plan).await?;
    tx.commit().await?;

    Ok(plan)
}

async fn write_plan(
    tx: &mut Transaction<'_, Postgres>,
    plan: &CanonicalWritePlan,
) -> Result<(), sqlx::Error> {
    if plan.is_empty() {
        return Ok(());
    }

    if !plan.deletions.is_empty() {
        sqlx::query("DELETE FROM skills WHERE id = ANY($1) AND canonical_skill_name IS NULL")
            .bind(&plan.deletions)
            .execute(&mut **tx)
            .await?;
    }

    if !plan.updates.is_empty() {
        let (ids, names): (Vec<Uuid>, Vec<String>) = plan.updates.iter().cloned().unzip();
        sqlx::query(
            r#"
            UPDATE skills AS s
            SET canonical_skill_name = u.canonical
            FROM UNNEST($1::uuid[], $2::text[]) AS u(id, canonical)
            WHERE s.id = u.id AND s.canonical_skill_name IS NULL
            "#,
        )
        .bind(&ids)
        .bind(&names)
        .execute(&mut **tx)
        .await?;
    }

    if !plan.inserts.is_empty() {
        let originals: Vec<&str> = plan.inserts.iter().map(|n| n.original_skill_name.as_str()).collect();
        let canonicals: Vec<&str> = plan.inserts.iter().map(|n| n.canonical_skill_name.as_str()).collect();
        let categories: Vec<Option<&str>> = plan.inserts.iter().map(|n| n.category.as_deref()).collect();
        sqlx::query(
            r#"
            INSERT INTO skills (original_skill_name, canonical_skill_name, category)
            SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[])
            "#,
        )
        .bind(&originals)
        .bind(&canonicals)
        .bind(&categories)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::SkillState;
    use crate::taxonomy::test_support::StubClassifier;

    fn pending(original: &str) -> SkillRecord {
        SkillRecord {
            id: Uuid::new_v4(),
            original_skill_name: original.to_string(),
            state: SkillState::Pending,
            category: Some("backend".to_string()),
        }
    }

    fn mapping(pairs: &[(&str, &[&str])]) -> ClassifierMapping {
        StubClassifier::with_canonical(pairs).canonical
    }

    fn pairs(items: &[(&str, &str)]) -> HashSet<(String, String)> {
        items
            .iter()
            .map(|(o, c)| (o.to_string(), c.to_string()))
            .collect()
    }

    /// Applies a plan to an in-memory table the way `write_plan` does.
    fn apply_plan(table: &mut Vec<SkillRecord>, plan: &CanonicalWritePlan) {
        table.retain(|r| !plan.deletions.contains(&r.id));
        for (id, name) in &plan.updates {
            if let Some(row) = table.iter_mut().find(|r| r.id == *id) {
                row.state = SkillState::Canonical(name.clone());
            }
        }
        for new in &plan.inserts {
            table.push(SkillRecord {
                id: Uuid::new_v4(),
                original_skill_name: new.original_skill_name.clone(),
                state: SkillState::Canonical(new.canonical_skill_name.clone()),
                category: new.category.clone(),
            });
        }
    }

    #[test]
    fn test_multi_split_updates_pending_and_adds_sibling() {
        let row = pending("Python/Go");
        let mut table = vec![row.clone()];
        let plan = plan_canonical_writes(
            &[row.clone()],
            &mapping(&[("Python/Go", &["Python", "Go"])]),
            &HashSet::new(),
        );

        assert_eq!(plan.updates, vec![(row.id, "Python".to_string())]);
        assert!(plan.deletions.is_empty());
        assert_eq!(
            plan.inserts,
            vec![NewSkill {
                original_skill_name: "Python/Go".to_string(),
                canonical_skill_name: "Go".to_string(),
                category: Some("backend".to_string()),
            }]
        );

        apply_plan(&mut table, &plan);
        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|r| r.original_skill_name == "Python/Go"));
        let original_row = table.iter().find(|r| r.id == row.id).unwrap();
        assert_eq!(original_row.state.canonical(), Some("Python"));
        assert!(table.iter().any(|r| r.state.canonical() == Some("Go")));
    }

    #[test]
    fn test_existing_pair_turns_update_into_deletion() {
        let row = pending("ReactJS");
        let plan = plan_canonical_writes(
            &[row.clone()],
            &mapping(&[("ReactJS", &["React"])]),
            &pairs(&[("ReactJS", "React")]),
        );
        assert!(plan.updates.is_empty());
        assert_eq!(plan.deletions, vec![row.id]);
        assert!(plan.inserts.is_empty());
    }

    #[test]
    fn test_existing_pair_drops_duplicate_sibling() {
        let row = pending("Python/Go");
        let plan = plan_canonical_writes(
            &[row.clone()],
            &mapping(&[("Python/Go", &["Python", "Go"])]),
            &pairs(&[("Python/Go", "Go")]),
        );
        assert_eq!(plan.updates, vec![(row.id, "Python".to_string())]);
        assert!(plan.inserts.is_empty());
    }

    #[test]
    fn test_first_name_taken_still_adds_remaining_names() {
        let row = pending("Python/Go");
        let mut table = vec![
            SkillRecord::canonical(Uuid::new_v4(), "Python/Go", "Python"),
            row.clone(),
        ];
        let plan = plan_canonical_writes(
            &[row.clone()],
            &mapping(&[("Python/Go", &["Python", "Go"])]),
            &pairs(&[("Python/Go", "Python")]),
        );
        assert_eq!(plan.deletions, vec![row.id]);
        assert_eq!(plan.inserts.len(), 1);

        apply_plan(&mut table, &plan);
        let mut names: Vec<&str> = table.iter().filter_map(|r| r.state.canonical()).collect();
        names.sort();
        assert_eq!(names, vec!["Go", "Python"]);
    }

    #[test]
    fn test_no_pair_written_twice_after_rerun() {
        let row = pending("Python/Go");
        let mut table = vec![row.clone()];
        let plan = plan_canonical_writes(
            &[row],
            &mapping(&[("Python/Go", &["Python", "Go"])]),
            &HashSet::new(),
        );
        apply_plan(&mut table, &plan);

        // A later run sees a fresh pending row for the same raw string.
        let again = pending("Python/Go");
        table.push(again.clone());
        let existing: HashSet<(String, String)> = table
            .iter()
            .filter_map(|r| {
                r.state
                    .canonical()
                    .map(|c| (r.original_skill_name.clone(), c.to_string()))
            })
            .collect();
        let plan = plan_canonical_writes(
            &[again],
            &mapping(&[("Python/Go", &["Python", "Go"])]),
            &existing,
        );
        apply_plan(&mut table, &plan);

        let mut seen = HashSet::new();
        for r in &table {
            let pair = (r.original_skill_name.clone(), r.state.canonical().map(String::from));
            assert!(seen.insert(pair), "duplicate pair in {table:?}");
        }
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unmapped_rows_are_left_alone() {
        let plan = plan_canonical_writes(
            &[pending("Kotlin")],
            &mapping(&[("Rust", &["Rust"])]),
            &HashSet::new(),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_key_mismatch_reports_both_sides() {
        let requested: BTreeMap<String, Option<String>> =
            [("Rust".to_string(), None), ("Kotlin".to_string(), None)].into();
        let returned = mapping(&[("Rust", &["Rust"]), ("Scala", &["Scala"])]);
        assert_eq!(
            key_mismatch(&requested, &returned),
            KeyMismatch {
                missing: vec!["Kotlin".to_string()],
                extra: vec!["Scala".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_overrides_short_circuit_the_classifier() {
        let classifier = StubClassifier::with_canonical(&[("Golang", &["Golang Language"])]);
        let resolution = resolve_batch(&[pending("Golang"), pending("k8s")], &classifier).await;

        assert_eq!(classifier.canonicalize_call_count(), 0);
        assert_eq!(resolution.from_overrides, 2);
        assert_eq!(
            resolution.mapping.get("Golang"),
            Some(&CanonicalTarget::Single("Go".to_string()))
        );
    }

    #[tokio::test]
    async fn test_only_the_remainder_is_sent_to_the_classifier() {
        let classifier = StubClassifier::with_canonical(&[
            ("React.js", &["React"]),
            ("Unrequested", &["Noise"]),
        ]);
        let resolution =
            resolve_batch(&[pending("Golang"), pending("React.js")], &classifier).await;

        let calls = classifier.canonicalize_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![vec!["React.js".to_string()]]);
        assert_eq!(resolution.mapping.len(), 2);
        assert!(!resolution.mapping.contains_key("Unrequested"));
        assert!(!resolution.classifier_failed);
    }

    #[tokio::test]
    async fn test_classifier_failure_keeps_override_results() {
        let classifier = StubClassifier::failing();
        let resolution = resolve_batch(&[pending("JS"), pending("Rust")], &classifier).await;

        assert!(resolution.classifier_failed);
        assert_eq!(resolution.mapping.len(), 1);
        assert!(resolution.mapping.contains_key("JS"));
    }

    async fn outcome_with(classifier: &StubClassifier, raw: &str) -> BatchOutcome {
        let resolution = resolve_batch(&[pending(raw)], classifier).await;
        BatchOutcome::before_apply(&resolution).unwrap_or(BatchOutcome::Applied {
            classifier_failed: resolution.classifier_failed,
        })
    }

    #[tokio::test]
    async fn test_two_failed_calls_in_a_row_stop() {
        let failing = StubClassifier::failing();
        let mut termination = Termination::default();

        let first = outcome_with(&failing, "Rust").await;
        assert_eq!(first, BatchOutcome::Unusable { classifier_failed: true });
        // The same rows are retried after a failed call.
        assert_eq!(termination.record(first), Step::Continue(SkipRows::None));

        let second = outcome_with(&failing, "Rust").await;
        assert_eq!(termination.record(second), Step::Stop);
        assert_eq!(failing.canonicalize_call_count(), 2);
    }

    #[tokio::test]
    async fn test_usable_batch_resets_the_count() {
        let failing = StubClassifier::failing();
        let answering = StubClassifier::with_canonical(&[("React.js", &["React"])]);
        let mut termination = Termination::default();

        let failed = outcome_with(&failing, "React.js").await;
        assert_eq!(termination.record(failed), Step::Continue(SkipRows::None));

        let usable = outcome_with(&answering, "React.js").await;
        assert_eq!(usable, BatchOutcome::Applied { classifier_failed: false });
        assert_eq!(termination.record(usable), Step::Continue(SkipRows::Unresolved));
        assert_eq!(termination.consecutive_unusable(), 0);

        let failed = outcome_with(&failing, "Kotlin").await;
        assert_eq!(termination.record(failed), Step::Continue(SkipRows::None));
    }

    #[tokio::test]
    async fn test_empty_answer_skips_rows_then_failure_stops() {
        let silent = StubClassifier::with_canonical(&[]);
        let failing = StubClassifier::failing();
        let mut termination = Termination::default();

        let empty = outcome_with(&silent, "Kotlin").await;
        assert_eq!(empty, BatchOutcome::Unusable { classifier_failed: false });
        assert_eq!(termination.record(empty), Step::Continue(SkipRows::Unresolved));

        let failed = outcome_with(&failing, "Scala").await;
        assert_eq!(termination.record(failed), Step::Stop);
    }

    #[tokio::test]
    async fn test_overrides_keep_a_failed_call_usable() {
        let failing = StubClassifier::failing();
        let resolution = resolve_batch(&[pending("JS"), pending("Rust")], &failing).await;
        assert_eq!(BatchOutcome::before_apply(&resolution), None);

        let mut termination = Termination::default();
        let step = termination.record(BatchOutcome::Applied { classifier_failed: true });
        assert_eq!(step, Step::Continue(SkipRows::None));
    }

    #[test]
    fn test_apply_failures_count_as_unusable() {
        let mut termination = Termination::default();
        assert_eq!(
            termination.record(BatchOutcome::ApplyFailed),
            Step::Continue(SkipRows::All)
        );
        assert_eq!(termination.record(BatchOutcome::ApplyFailed), Step::Stop);
    }
}
