use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::errors::AtlasError;
use crate::llm_client::LlmClient;
use crate::taxonomy::classifier::{LlmSkillClassifier, SkillClassifier};

/// Shared state handed to every pipeline stage.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable classifier. Absent when no API key is configured; only the
    /// normalize and deduplicate stages ask for it.
    pub classifier: Option<Arc<dyn SkillClassifier>>,
}

impl AppState {
    /// Wires the production classifier when an API key is available.
    pub fn new(db: PgPool, config: Config) -> Result<Self, AtlasError> {
        let classifier: Option<Arc<dyn SkillClassifier>> = match &config.anthropic_api_key {
            Some(key) => {
                let llm = LlmClient::new(key.clone(), &config.anthropic_base_url, &config.model)?;
                info!("LLM client initialized (model: {})", llm.model());
                Some(Arc::new(LlmSkillClassifier(llm)))
            }
            None => None,
        };

        Ok(Self {
            db,
            config,
            classifier,
        })
    }

    pub fn classifier(&self) -> Result<&dyn SkillClassifier, AtlasError> {
        self.classifier.as_deref().ok_or_else(|| {
            AtlasError::Config(
                "Required environment variable 'ANTHROPIC_API_KEY' is not set".to_string(),
            )
        })
    }
}
