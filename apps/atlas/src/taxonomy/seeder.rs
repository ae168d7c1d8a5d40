//! Skill seeder: scans every posting and registers each distinct raw skill string once,
//! as a pending row waiting for the canonicalizer.

use std::collections::{BTreeMap, HashSet};

use futures_util::TryStreamExt;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, error, info};

use crate::errors::AtlasError;
use crate::models::offer::OfferTagsRow;
use crate::taxonomy::parser::parse_skill_names;

const SEED_INSERT_CHUNK: usize = 1000;

/// Distinct raw strings across the corpus, each with the first category it appeared under.
/// The category is context for the classifier only; it is not part of the key.
#[derive(Debug, Default)]
pub struct RawSkillCorpus {
    skills: BTreeMap<String, Option<String>>,
    offers_scanned: usize,
}

impl RawSkillCorpus {
    pub fn add_offer(&mut self, offer: &OfferTagsRow) {
        let Some(tags) = offer.tech_stack.as_deref() else {
            return;
        };
        self.offers_scanned += 1;

        let names = parse_skill_names(tags);
        if names.is_empty() {
            debug!("No skills parsed from tech stack of {}", offer.job_url);
        }
        for name in names {
            self.skills
                .entry(name)
                .or_insert_with(|| offer.category.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn offers_scanned(&self) -> usize {
        self.offers_scanned
    }

    #[cfg(test)]
    pub fn category_of(&self, raw: &str) -> Option<&str> {
        self.skills.get(raw).and_then(|c| c.as_deref())
    }

    /// Raw strings not yet known to the taxonomy in any state, pending or canonical.
    pub fn new_candidates(&self, known: &HashSet<String>) -> Vec<(String, Option<String>)> {
        self.skills
            .iter()
            .filter(|(name, _)| !known.contains(name.as_str()))
            .map(|(name, category)| (name.clone(), category.clone()))
            .collect()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SeedSummary {
    pub offers_scanned: usize,
    pub distinct_skills: usize,
    pub inserted: u64,
}

/// Extract stage: seeds pending rows for every raw skill string not yet in `skills`.
/// Rerunning on an unchanged corpus inserts nothing.
pub async fn seed_skills(pool: &PgPool) -> Result<SeedSummary, AtlasError> {
    info!("Extracting distinct skills from offers...");

    let mut corpus = RawSkillCorpus::default();
    {
        let mut offers = sqlx::query_as::<_, OfferTagsRow>(
            "SELECT job_url, tech_stack, category FROM offers WHERE tech_stack IS NOT NULL ORDER BY job_url",
        )
        .fetch(pool);

        while let Some(offer) = offers.try_next().await? {
            corpus.add_offer(&offer);
        }
    }
    info!(
        "Found {} distinct raw skills across {} offers",
        corpus.len(),
        corpus.offers_scanned()
    );

    let known: HashSet<String> =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT original_skill_name FROM skills")
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let candidates = corpus.new_candidates(&known);
    let mut inserted = 0u64;

    for chunk in candidates.chunks(SEED_INSERT_CHUNK) {
        match insert_pending(pool, chunk).await {
            Ok(n) => inserted += n,
            Err(e) => error!("Failed to insert a chunk of {} pending skills: {e}", chunk.len()),
        }
    }

    info!("Seeded {inserted} new pending skills ({} already known)", known.len());

    Ok(SeedSummary {
        offers_scanned: corpus.offers_scanned(),
        distinct_skills: corpus.len(),
        inserted,
    })
}

/// The pending-row partial index makes this idempotent even if `known` is stale.
async fn insert_pending(
    pool: &PgPool,
    chunk: &[(String, Option<String>)],
) -> Result<u64, sqlx::Error> {
    let (names, categories): (Vec<String>, Vec<Option<String>>) = chunk.iter().cloned().unzip();

    let result = sqlx::query(
        r#"
        INSERT INTO skills (original_skill_name, category)
        SELECT u.name, u.category
        FROM UNNEST($1::text[], $2::text[]) AS u(name, category)
        WHERE NOT EXISTS (
            SELECT 1 FROM skills s WHERE s.original_skill_name = u.name
        )
        ON CONFLICT (original_skill_name) WHERE canonical_skill_name IS NULL DO NOTHING
        "#,
    )
    .bind(&names)
    .bind(&categories)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
