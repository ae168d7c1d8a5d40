//! Linker: writes posting ↔ skill edges for every canonical row a posting's tags resolve to.
//!
//! Postings are streamed from a read-only snapshot; edges are buffered and flushed in pages,
//! one transaction per page. Inserts ignore existing edges, so the stage is always rerunnable.

use std::collections::{BTreeSet, HashMap};

use futures_util::TryStreamExt;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::errors::AtlasError;
use crate::models::offer::{OfferSkillEdge, OfferTagsRow};
use crate::taxonomy::parser::parse_skill_names;

/// Raw string → ids of every canonical row it owns (more than one after a multi-split).
pub type SkillIndex = HashMap<String, Vec<Uuid>>;

pub fn build_index(rows: impl IntoIterator<Item = (Uuid, String)>) -> SkillIndex {
    let mut index = SkillIndex::new();
    for (id, original) in rows {
        index.entry(original).or_default().push(id);
    }
    index
}

/// Edges for one posting, deduplicated. Raw strings with no canonical row yield nothing.
pub fn resolve_offer_edges(offer: &OfferTagsRow, index: &SkillIndex) -> Vec<OfferSkillEdge> {
    let Some(tags) = offer.tech_stack.as_deref() else {
        return Vec::new();
    };

    let edges: BTreeSet<OfferSkillEdge> = parse_skill_names(tags)
        .iter()
        .filter_map(|raw| index.get(raw))
        .flatten()
        .map(|id| OfferSkillEdge {
            job_url: offer.job_url.clone(),
            skill_id: *id,
        })
        .collect();

    edges.into_iter().collect()
}

#[derive(Debug, Default, Serialize)]
pub struct LinkSummary {
    pub offers_scanned: usize,
    pub offers_linked: usize,
    pub edges_inserted: u64,
    pub pages_failed: usize,
}

/// Link stage.
pub async fn link_offers(pool: &PgPool, page_size: usize) -> Result<LinkSummary, AtlasError> {
    let index = build_index(
        sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, original_skill_name FROM skills WHERE canonical_skill_name IS NOT NULL",
        )
        .fetch_all(pool)
        .await?,
    );
    info!("Linking offers against {} resolved raw strings...", index.len());

    let mut summary = LinkSummary::default();
    let mut page: Vec<OfferSkillEdge> = Vec::with_capacity(page_size);

    let mut scan = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *scan)
        .await?;
    {
        let mut offers = sqlx::query_as::<_, OfferTagsRow>(
            "SELECT job_url, tech_stack, category FROM offers WHERE tech_stack IS NOT NULL ORDER BY job_url",
        )
        .fetch(&mut *scan);

        while let Some(offer) = offers.try_next().await? {
            summary.offers_scanned += 1;
            let edges = resolve_offer_edges(&offer, &index);
            if edges.is_empty() {
                debug!("No resolved skills for {}", offer.job_url);
                continue;
            }
            summary.offers_linked += 1;
            page.extend(edges);

            if page.len() >= page_size {
                flush_page(pool, &mut page, &mut summary).await;
            }
        }
    }
    scan.commit().await?;

    if !page.is_empty() {
        flush_page(pool, &mut page, &mut summary).await;
    }

    info!(
        "Linking done: {} offers scanned, {} linked, {} new edges, {} failed pages",
        summary.offers_scanned, summary.offers_linked, summary.edges_inserted, summary.pages_failed
    );
    Ok(summary)
}

async fn flush_page(pool: &PgPool, page: &mut Vec<OfferSkillEdge>, summary: &mut LinkSummary) {
    match insert_edges(pool, page).await {
        Ok(n) => summary.edges_inserted += n,
        Err(e) => {
            error!("Failed to write a page of {} edges: {e}", page.len());
            summary.pages_failed += 1;
        }
    }
    page.clear();
}

async fn insert_edges(pool: &PgPool, edges: &[OfferSkillEdge]) -> Result<u64, sqlx::Error> {
    let urls: Vec<&str> = edges.iter().map(|e| e.job_url.as_str()).collect();
    let ids: Vec<Uuid> = edges.iter().map(|e| e.skill_id).collect();

    let mut tx = pool.begin().await?;
    let inserted = sqlx::query(
        r#"
        INSERT INTO offer_skills (job_url, skill_id)
        SELECT * FROM UNNEST($1::text[], $2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(&urls)
    .bind(&ids)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    tx.commit().await?;

    Ok(inserted)
}
