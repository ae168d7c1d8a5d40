//! Stage selection and the sequential driver.
//!
//! extract → normalize → deduplicate → link. Every stage is idempotent, so any one of them
//! can be rerun on its own.

use clap::ValueEnum;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::{ensure_schema, reset_taxonomy};
use crate::errors::AtlasError;
use crate::state::AppState;
use crate::taxonomy::audit::{audit_collisions, CollisionReport, DEFAULT_SAMPLE};
use crate::taxonomy::canonicalizer::{canonicalize_pending, CanonicalizeSummary};
use crate::taxonomy::linker::{link_offers, LinkSummary};
use crate::taxonomy::merge::{merge_synonyms, MergeSummary};
use crate::taxonomy::seeder::{seed_skills, SeedSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    All,
    Extract,
    Normalize,
    Deduplicate,
    Link,
}

impl Stage {
    /// Whether selecting `self` runs `step`.
    pub fn runs(self, step: Stage) -> bool {
        self == Stage::All || self == step
    }

    pub fn needs_classifier(self) -> bool {
        self.runs(Stage::Normalize) || self.runs(Stage::Deduplicate)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct PipelineReport {
    pub seed: Option<SeedSummary>,
    pub normalize: Option<CanonicalizeSummary>,
    pub deduplicate: Option<MergeSummary>,
    pub audit: Option<CollisionReport>,
    pub link: Option<LinkSummary>,
}

pub async fn run(state: &AppState, stage: Stage, reset: bool) -> Result<PipelineReport, AtlasError> {
    // Fail before touching the database if the classifier will be missing.
    if stage.needs_classifier() {
        state.classifier()?;
    }

    if reset || stage.runs(Stage::Extract) {
        ensure_schema(&state.db).await?;
    }
    if reset {
        reset_taxonomy(&state.db).await?;
        if !stage.runs(Stage::Extract) {
            warn!("Taxonomy was reset but '{stage:?}' does not reseed it; run 'extract' next");
        }
    }

    let mut report = PipelineReport::default();

    if stage.runs(Stage::Extract) {
        info!("=== Stage: extract ===");
        report.seed = Some(seed_skills(&state.db).await?);
    }

    if stage.runs(Stage::Normalize) {
        info!("=== Stage: normalize ===");
        report.normalize = Some(
            canonicalize_pending(
                &state.db,
                state.classifier()?,
                state.config.normalize_batch_size,
            )
            .await?,
        );
    }

    if stage.runs(Stage::Deduplicate) {
        info!("=== Stage: deduplicate ===");
        report.deduplicate = Some(
            merge_synonyms(&state.db, state.classifier()?, state.config.dedup_chunk_size).await?,
        );
        report.audit = Some(audit_collisions(&state.db, DEFAULT_SAMPLE).await?);
    }

    if stage.runs(Stage::Link) {
        info!("=== Stage: link ===");
        report.link = Some(link_offers(&state.db, state.config.link_page_size).await?);
    }

    info!("Pipeline finished ({stage:?})");
    Ok(report)
}
