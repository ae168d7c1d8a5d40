//! Collision auditor. Read-only.
//!
//! A raw string with several canonical names is either a deliberate multi-split
//! ("Python/Go" → Python, Go) or a collision: the same single skill canonicalized two ways
//! by different classifier calls ("AI" → AI, Artificial Intelligence). Collisions are reported
//! for an operator; nothing here resolves them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::errors::AtlasError;

pub const DEFAULT_SAMPLE: usize = 20;

const COMPOSITE_SEPARATORS: &[&str] = &["/", "|", "&", ",", ";", " + "];
const COMPOSITE_WORDS: &[&str] = &["or", "and"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub original_skill_name: String,
    pub canonical_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollisionReport {
    pub generated_at: DateTime<Utc>,
    pub collisions: usize,
    pub multi_splits: usize,
    /// At most `sample` collisions, ordered by raw string.
    pub sample: Vec<Collision>,
}

/// Whether a raw string reads like several skills joined together.
pub fn looks_composite(raw: &str) -> bool {
    if COMPOSITE_SEPARATORS.iter().any(|sep| raw.contains(sep)) {
        return true;
    }
    raw.split_whitespace()
        .any(|word| COMPOSITE_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w)))
}

/// Splits groups of (raw string, distinct canonical names) into collisions and multi-splits.
/// Groups with a single canonical name are ignored.
pub fn find_collisions(
    groups: impl IntoIterator<Item = (String, Vec<String>)>,
) -> (Vec<Collision>, usize) {
    let mut collisions = Vec::new();
    let mut multi_splits = 0;

    for (original, mut canonicals) in groups {
        canonicals.sort();
        canonicals.dedup();
        if canonicals.len() < 2 {
            continue;
        }
        if looks_composite(&original) {
            multi_splits += 1;
        } else {
            collisions.push(Collision {
                original_skill_name: original,
                canonical_names: canonicals,
            });
        }
    }

    collisions.sort_by(|a, b| a.original_skill_name.cmp(&b.original_skill_name));
    (collisions, multi_splits)
}

pub async fn audit_collisions(pool: &PgPool, sample: usize) -> Result<CollisionReport, AtlasError> {
    let groups = sqlx::query_as::<_, (String, Vec<String>)>(
        r#"
        SELECT original_skill_name,
               ARRAY_AGG(DISTINCT canonical_skill_name ORDER BY canonical_skill_name)
        FROM skills
        WHERE canonical_skill_name IS NOT NULL
        GROUP BY original_skill_name
        HAVING COUNT(DISTINCT canonical_skill_name) > 1
        "#,
    )
    .fetch_all(pool)
    .await?;

    let (collisions, multi_splits) = find_collisions(groups);
    let report = CollisionReport {
        generated_at: Utc::now(),
        collisions: collisions.len(),
        multi_splits,
        sample: collisions.into_iter().take(sample).collect(),
    };

    if report.collisions == 0 {
        info!("Audit: no collisions ({} multi-splits)", report.multi_splits);
    } else {
        warn!(
            "Audit: {} raw strings canonicalized inconsistently ({} multi-splits)",
            report.collisions, report.multi_splits
        );
        for c in &report.sample {
            warn!("  '{}' -> {:?}", c.original_skill_name, c.canonical_names);
        }
    }

    Ok(report)
}
