use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the taxonomy tables and their uniqueness guarantees if missing.
/// `offers` is owned by the crawler; it is only created here so a fresh database works.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS offers (
            job_url TEXT PRIMARY KEY,
            tech_stack TEXT,
            category TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS skills (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            original_skill_name TEXT NOT NULL,
            canonical_skill_name TEXT,
            category TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One pending row per raw string.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS skills_pending_original_key
            ON skills (original_skill_name)
            WHERE canonical_skill_name IS NULL
        "#,
    )
    .execute(pool)
    .await?;

    // Never the same (original, canonical) pair twice.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS skills_original_canonical_key
            ON skills (original_skill_name, canonical_skill_name)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS skills_canonical_idx ON skills (canonical_skill_name)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS offer_skills (
            job_url TEXT NOT NULL REFERENCES offers (job_url) ON DELETE CASCADE,
            skill_id UUID NOT NULL REFERENCES skills (id) ON DELETE CASCADE,
            PRIMARY KEY (job_url, skill_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Taxonomy schema ready");
    Ok(())
}

/// Empties the taxonomy. Cascades to `offer_skills` and anything else referencing `skills`.
pub async fn reset_taxonomy(pool: &PgPool) -> Result<()> {
    warn!("Resetting skill taxonomy: truncating skills and all dependent edges");
    sqlx::query("TRUNCATE TABLE skills CASCADE")
        .execute(pool)
        .await?;
    Ok(())
}
