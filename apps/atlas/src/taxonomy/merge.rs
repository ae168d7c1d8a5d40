//! Merge engine: folds synonymous canonical names into one survivor.
//!
//! Two passes over the sorted set of canonical names:
//!   A. deterministic: names equal after dropping whitespace, dots and hyphens (case-folded)
//!      merge into the alphabetically-first spelling
//!   B. classifier: chunks of the remaining names are checked for true synonyms
//!
//! Each (old → new) pair is applied in its own transaction: rows at `old` move to `new` only
//! where their raw string has no row at `new` yet; the rest would duplicate a pair and are
//! deleted instead. The raw string keeps its row at `new` either way.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::AtlasError;
use crate::models::skill::{SkillRecord, SkillRow};
use crate::taxonomy::classifier::SkillClassifier;

/// Key under which spelling variants collide: "Node.js", "NodeJS" and "node js" agree.
pub fn simplified_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Pass A. Returns (old, survivor) pairs; the survivor is the alphabetically-first name of
/// each group.
pub fn deterministic_merges(names: &[String]) -> Vec<(String, String)> {
    let mut groups: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for name in names {
        let key = simplified_key(name);
        if key.is_empty() {
            continue;
        }
        groups.entry(key).or_default().insert(name.as_str());
    }

    let mut merges = Vec::new();
    for members in groups.values().filter(|m| m.len() > 1) {
        let mut iter = members.iter();
        let Some(survivor) = iter.next() else {
            continue;
        };
        for old in iter {
            merges.push((old.to_string(), survivor.to_string()));
        }
    }
    merges
}

/// Cleans a classifier proposal against the names that actually exist.
///
/// Self-maps and unknown names are dropped. Chains (`a → b`, `b → c`) are collapsed so every
/// pair points at a final survivor; cycles are dropped entirely.
pub fn sanitize_synonyms(
    proposed: &BTreeMap<String, String>,
    current: &BTreeSet<String>,
) -> Vec<(String, String)> {
    let usable: BTreeMap<&str, &str> = proposed
        .iter()
        .filter(|(old, new)| old != new && current.contains(old.as_str()))
        .map(|(old, new)| (old.as_str(), new.as_str()))
        .collect();

    let mut merges = Vec::new();
    'pairs: for (&old, &new) in &usable {
        let mut target = new;
        let mut seen: HashSet<&str> = HashSet::from([old]);
        while let Some(&next) = usable.get(target) {
            if !seen.insert(target) {
                debug!("Dropping cyclic synonym chain starting at '{old}'");
                continue 'pairs;
            }
            target = next;
        }
        if target == old {
            debug!("Dropping cyclic synonym chain starting at '{old}'");
            continue;
        }
        merges.push((old.to_string(), target.to_string()));
    }
    merges
}

/// Pass B proposals. `names` must be sorted; chunks that fail are skipped with a warning.
pub async fn propose_synonym_merges(
    classifier: &dyn SkillClassifier,
    names: &[String],
    chunk_size: usize,
) -> Vec<(String, String)> {
    let current: BTreeSet<String> = names.iter().cloned().collect();
    let mut proposed: BTreeMap<String, String> = BTreeMap::new();

    for (i, chunk) in names.chunks(chunk_size.max(1)).enumerate() {
        match classifier.find_synonyms(chunk).await {
            Ok(found) => {
                debug!("Chunk {}: {} synonym proposals", i + 1, found.len());
                proposed.extend(found);
            }
            Err(e) => warn!("Synonym lookup failed for chunk {}: {e}", i + 1),
        }
    }

    sanitize_synonyms(&proposed, &current)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub updates: Vec<Uuid>,
    pub deletions: Vec<Uuid>,
}

/// What merging `old` into `new` does to a snapshot of the table. Mirrors `apply_merge`.
pub fn plan_merge(snapshot: &[SkillRecord], old: &str, new: &str) -> MergePlan {
    let already_at_new: HashSet<&str> = snapshot
        .iter()
        .filter(|r| r.state.canonical() == Some(new))
        .map(|r| r.original_skill_name.as_str())
        .collect();

    let mut plan = MergePlan::default();
    for row in snapshot.iter().filter(|r| r.state.canonical() == Some(old)) {
        if already_at_new.contains(row.original_skill_name.as_str()) {
            plan.deletions.push(row.id);
        } else {
            plan.updates.push(row.id);
        }
    }
    plan
}

#[derive(Debug, Default, Serialize)]
pub struct MergeSummary {
    pub deterministic_pairs: usize,
    pub classifier_pairs: usize,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub failed_pairs: usize,
}

/// Deduplicate stage.
pub async fn merge_synonyms(
    pool: &PgPool,
    classifier: &dyn SkillClassifier,
    chunk_size: usize,
) -> Result<MergeSummary, AtlasError> {
    let mut summary = MergeSummary::default();

    let names = fetch_canonical_names(pool).await?;
    info!("Deduplicating {} canonical names...", names.len());

    let pass_a = deterministic_merges(&names);
    summary.deterministic_pairs = pass_a.len();
    info!("Deterministic pass: {} spelling variants to merge", pass_a.len());
    apply_all(pool, &pass_a, &mut summary).await;

    let names = fetch_canonical_names(pool).await?;
    info!(
        "Classifier pass over {} names in chunks of {chunk_size}",
        names.len()
    );
    let pass_b = propose_synonym_merges(classifier, &names, chunk_size).await;
    summary.classifier_pairs = pass_b.len();
    for (old, new) in &pass_b {
        info!("Merging '{old}' -> '{new}'");
    }
    apply_all(pool, &pass_b, &mut summary).await;

    info!(
        "Deduplication done: {} + {} pairs, {} rows renamed, {} redundant rows removed, {} failed",
        summary.deterministic_pairs,
        summary.classifier_pairs,
        summary.rows_updated,
        summary.rows_deleted,
        summary.failed_pairs
    );
    Ok(summary)
}

async fn apply_all(pool: &PgPool, pairs: &[(String, String)], summary: &mut MergeSummary) {
    for (old, new) in pairs {
        match apply_merge(pool, old, new).await {
            Ok((updated, deleted)) => {
                summary.rows_updated += updated;
                summary.rows_deleted += deleted;
            }
            Err(e) => {
                error!("Failed to merge '{old}' into '{new}': {e}");
                summary.failed_pairs += 1;
            }
        }
    }
}

/// Sorted in Rust so chunking does not depend on the database collation.
async fn fetch_canonical_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let mut names = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT canonical_skill_name FROM skills WHERE canonical_skill_name IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;
    names.sort();
    Ok(names)
}

/// Loads the rows at `old` or `new`, plans against them, then writes the plan.
async fn apply_merge(pool: &PgPool, old: &str, new: &str) -> Result<(u64, u64), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let snapshot: Vec<SkillRecord> = sqlx::query_as::<_, SkillRow>(
        r#"
        SELECT id, original_skill_name, canonical_skill_name, category
        FROM skills
        WHERE canonical_skill_name = $1 OR canonical_skill_name = $2
        FOR UPDATE
        "#,
    )
    .bind(old)
    .bind(new)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(SkillRecord::from)
    .collect();

    let plan = plan_merge(&snapshot, old, new);

    let deleted = if plan.deletions.is_empty() {
        0
    } else {
        sqlx::query("DELETE FROM skills WHERE id = ANY($1)")
            .bind(&plan.deletions)
            .execute(&mut *tx)
            .await?
            .rows_affected()
    };

    let updated = if plan.updates.is_empty() {
        0
    } else {
        sqlx::query(
            "UPDATE skills SET canonical_skill_name = $2 WHERE id = ANY($1) AND canonical_skill_name = $3",
        )
        .bind(&plan.updates)
        .bind(new)
        .bind(old)
        .execute(&mut *tx)
        .await?
        .rows_affected()
    };

    tx.commit().await?;
    Ok((updated, deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::test_support::StubClassifier;

    fn names(items: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        v.sort();
        v
    }

    fn apply_plan(table: &mut Vec<SkillRecord>, plan: &MergePlan, new: &str) {
        table.retain(|r| !plan.deletions.contains(&r.id));
        for row in table.iter_mut().filter(|r| plan.updates.contains(&r.id)) {
            row.state = crate::models::skill::SkillState::Canonical(new.to_string());
        }
    }

    #[test]
    fn test_simplified_key() {
        assert_eq!(simplified_key("Node.js"), "nodejs");
        assert_eq!(simplified_key(" Type-Script "), "typescript");
        assert_eq!(simplified_key("C#"), "c#");
    }

    #[test]
    fn test_deterministic_merges_pick_first_spelling() {
        let merges = deterministic_merges(&names(&["NodeJS", "Node.js", "node js", "React"]));
        assert_eq!(
            merges,
            vec![
                ("NodeJS".to_string(), "Node.js".to_string()),
                ("node js".to_string(), "Node.js".to_string()),
            ]
        );
    }

    #[test]
    fn test_deterministic_merges_leave_distinct_names() {
        assert!(deterministic_merges(&names(&["C", "C#", "C++", "Go"])).is_empty());
    }

    #[test]
    fn test_merge_into_name_held_by_other_raw_string_renames() {
        let react_js = SkillRecord::canonical(Uuid::new_v4(), "ReactJS", "ReactJS");
        let react = SkillRecord::canonical(Uuid::new_v4(), "React", "React");
        let plan = plan_merge(&[react_js.clone(), react], "ReactJS", "React");
        assert_eq!(plan.updates, vec![react_js.id]);
        assert!(plan.deletions.is_empty());
    }

    #[test]
    fn test_merge_collision_deletes_instead_of_duplicating() {
        // "React/ReactJS" already fans out to both names.
        let at_old = SkillRecord::canonical(Uuid::new_v4(), "React/ReactJS", "ReactJS");
        let at_new = SkillRecord::canonical(Uuid::new_v4(), "React/ReactJS", "React");
        let elsewhere = SkillRecord::canonical(Uuid::new_v4(), "ReactJS", "ReactJS");
        let mut table = vec![at_old.clone(), at_new.clone(), elsewhere.clone()];

        let plan = plan_merge(&table, "ReactJS", "React");
        assert_eq!(plan.deletions, vec![at_old.id]);
        assert_eq!(plan.updates, vec![elsewhere.id]);

        apply_plan(&mut table, &plan, "React");
        let mut pairs: Vec<(String, Option<String>)> = table
            .iter()
            .map(|r| (r.original_skill_name.clone(), r.state.canonical().map(String::from)))
            .collect();
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), table.len(), "duplicate pair after merge");
        // Every raw string still has a canonical row.
        for original in ["React/ReactJS", "ReactJS"] {
            assert!(table.iter().any(|r| r.original_skill_name == original));
        }
    }

    #[test]
    fn test_sanitize_collapses_chains_and_drops_noise() {
        let current: BTreeSet<String> = names(&["JS", "Javascript", "JavaScript", "React"])
            .into_iter()
            .collect();
        let proposed: BTreeMap<String, String> = [
            ("JS", "Javascript"),
            ("Javascript", "JavaScript"),
            ("React", "React"),
            ("Vue.js", "Vue"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        assert_eq!(
            sanitize_synonyms(&proposed, &current),
            vec![
                ("JS".to_string(), "JavaScript".to_string()),
                ("Javascript".to_string(), "JavaScript".to_string()),
            ]
        );
    }

    #[test]
    fn test_sanitize_drops_cycles() {
        let current: BTreeSet<String> = names(&["A", "B", "C"]).into_iter().collect();
        let proposed: BTreeMap<String, String> = [("A", "B"), ("B", "A"), ("C", "B")]
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        assert!(sanitize_synonyms(&proposed, &current).is_empty());
    }

    #[tokio::test]
    async fn test_proposals_are_requested_per_chunk() {
        let classifier = StubClassifier::with_synonyms(&[("ReactJS", "React"), ("K8s", "Kubernetes")]);
        let all = names(&["K8s", "Kubernetes", "React", "ReactJS", "Rust"]);

        let merges = propose_synonym_merges(&classifier, &all, 2).await;

        assert_eq!(classifier.synonym_calls.lock().unwrap().len(), 3);
        assert_eq!(
            merges,
            vec![
                ("K8s".to_string(), "Kubernetes".to_string()),
                ("ReactJS".to_string(), "React".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_chunks_propose_nothing() {
        let classifier = StubClassifier::failing();
        let merges = propose_synonym_merges(&classifier, &names(&["JS", "JavaScript"]), 200).await;
        assert!(merges.is_empty());
    }
}
