//! Classifier capability: the narrow seam between the pipeline and the model.
//!
//! The pipeline only ever sees `SkillClassifier`. `LlmSkillClassifier` is the production
//! backend; tests swap in deterministic stubs. Output cleanup (fence stripping, truncation
//! repair, shape validation) happens here and nowhere else.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::GRANULARITY_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};
use crate::taxonomy::prompts::{
    CANONICALIZE_PROMPT, CANONICALIZE_SYSTEM, SYNONYMS_PROMPT, SYNONYMS_SYSTEM,
};
use crate::taxonomy::repair::parse_with_repair;

/// What the classifier proposes for one raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalTarget {
    Single(String),
    /// A composite raw string; order is the classifier's, first element first.
    Split(Vec<String>),
}

impl CanonicalTarget {
    /// Canonical names in order, blanks removed and repeats collapsed.
    pub fn names(&self) -> Vec<&str> {
        let raw: Vec<&str> = match self {
            CanonicalTarget::Single(name) => vec![name.as_str()],
            CanonicalTarget::Split(names) => names.iter().map(String::as_str).collect(),
        };
        let mut out: Vec<&str> = Vec::with_capacity(raw.len());
        for name in raw.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

pub type ClassifierMapping = BTreeMap<String, CanonicalTarget>;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier call failed: {0}")]
    Transport(#[from] LlmError),

    #[error("classifier returned malformed output: {0}")]
    Malformed(String),
}

/// The external text-classification capability. Unreliable by contract: it may omit keys,
/// truncate, or disagree with itself between calls.
#[async_trait]
pub trait SkillClassifier: Send + Sync {
    /// Maps each raw string (with its category hint) to one or more canonical names.
    async fn canonicalize(
        &self,
        batch: &BTreeMap<String, Option<String>>,
    ) -> Result<ClassifierMapping, ClassifierError>;

    /// Maps redundant canonical names to the best name of their synonym cluster.
    async fn find_synonyms(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, String>, ClassifierError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmSkillClassifier: production backend
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmSkillClassifier(pub LlmClient);

#[async_trait]
impl SkillClassifier for LlmSkillClassifier {
    async fn canonicalize(
        &self,
        batch: &BTreeMap<String, Option<String>>,
    ) -> Result<ClassifierMapping, ClassifierError> {
        let input_json = serde_json::to_string_pretty(batch)
            .map_err(|e| ClassifierError::Malformed(format!("cannot encode request: {e}")))?;
        let prompt = CANONICALIZE_PROMPT
            .replace("{granularity}", GRANULARITY_INSTRUCTION)
            .replace("{input_json}", &input_json);

        let text = self.0.call_text(&prompt, CANONICALIZE_SYSTEM).await?;
        mapping_from_value(recover_object(&text)?)
    }

    async fn find_synonyms(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, String>, ClassifierError> {
        let names_json = serde_json::to_string_pretty(names)
            .map_err(|e| ClassifierError::Malformed(format!("cannot encode request: {e}")))?;
        let prompt = SYNONYMS_PROMPT
            .replace("{granularity}", GRANULARITY_INSTRUCTION)
            .replace("{names_json}", &names_json);

        let text = self.0.call_text(&prompt, SYNONYMS_SYSTEM).await?;
        synonyms_from_value(recover_object(&text)?)
    }
}

fn recover_object(text: &str) -> Result<Value, ClassifierError> {
    let recovered = parse_with_repair(text).ok_or_else(|| {
        ClassifierError::Malformed(format!(
            "unparseable response: {}",
            text.chars().take(200).collect::<String>()
        ))
    })?;
    if recovered.was_repaired() {
        warn!("Classifier response was truncated; repaired by dropping the trailing member");
    }
    Ok(recovered.into_value())
}

/// Validates the shape of a canonicalization response. Values that are neither a string nor
/// a list of strings are dropped with a warning; the rest of the mapping is kept.
pub fn mapping_from_value(value: Value) -> Result<ClassifierMapping, ClassifierError> {
    let Value::Object(entries) = value else {
        return Err(ClassifierError::Malformed(
            "expected a JSON object mapping raw names to canonical names".to_string(),
        ));
    };

    let mut mapping = ClassifierMapping::new();
    for (raw, target) in entries {
        let target = match target {
            Value::String(name) => CanonicalTarget::Single(name),
            Value::Array(items) => {
                let names: Option<Vec<String>> = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect();
                match names {
                    Some(names) => CanonicalTarget::Split(names),
                    None => {
                        warn!("Dropping classifier entry '{raw}': list holds non-string values");
                        continue;
                    }
                }
            }
            other => {
                warn!("Dropping classifier entry '{raw}': unexpected value {other}");
                continue;
            }
        };
        if target.names().is_empty() {
            debug!("Dropping classifier entry '{raw}': no usable canonical name");
            continue;
        }
        mapping.insert(raw, target);
    }
    Ok(mapping)
}

/// Validates a synonym response: `{ "redundant": "best" }`, string values only.
pub fn synonyms_from_value(value: Value) -> Result<BTreeMap<String, String>, ClassifierError> {
    let Value::Object(entries) = value else {
        return Err(ClassifierError::Malformed(
            "expected a JSON object mapping redundant names to best names".to_string(),
        ));
    };

    Ok(entries
        .into_iter()
        .filter_map(|(old, new)| match new {
            Value::String(new) if !new.trim().is_empty() => Some((old, new.trim().to_string())),
            other => {
                warn!("Dropping synonym entry '{old}': unexpected value {other}");
                None
            }
        })
        .collect())
}
