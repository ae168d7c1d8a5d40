use thiserror::Error;

use crate::llm_client::LlmError;

/// Pipeline-level error type.
/// Stages return `Result<T, AtlasError>`; per-batch failures are logged inside the stage
/// and never surface here.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
