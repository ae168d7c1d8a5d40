//! Deterministic classifier stub shared by the taxonomy tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::taxonomy::classifier::{
    CanonicalTarget, ClassifierError, ClassifierMapping, SkillClassifier,
};

/// Answers from fixed tables and records every request it receives.
#[derive(Default)]
pub struct StubClassifier {
    pub canonical: BTreeMap<String, CanonicalTarget>,
    pub synonyms: BTreeMap<String, String>,
    pub fail: bool,
    pub canonicalize_calls: Mutex<Vec<Vec<String>>>,
    pub synonym_calls: Mutex<Vec<Vec<String>>>,
}

impl StubClassifier {
    pub fn with_canonical(pairs: &[(&str, &[&str])]) -> Self {
        let canonical = pairs
            .iter()
            .map(|(raw, names)| {
                let target = match names {
                    [single] => CanonicalTarget::Single(single.to_string()),
                    many => CanonicalTarget::Split(many.iter().map(|n| n.to_string()).collect()),
                };
                (raw.to_string(), target)
            })
            .collect();
        Self {
            canonical,
            ..Self::default()
        }
    }

    pub fn with_synonyms(pairs: &[(&str, &str)]) -> Self {
        Self {
            synonyms: pairs
                .iter()
                .map(|(old, new)| (old.to_string(), new.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn canonicalize_call_count(&self) -> usize {
        self.canonicalize_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SkillClassifier for StubClassifier {
    async fn canonicalize(
        &self,
        batch: &BTreeMap<String, Option<String>>,
    ) -> Result<ClassifierMapping, ClassifierError> {
        self.canonicalize_calls
            .lock()
            .unwrap()
            .push(batch.keys().cloned().collect());
        if self.fail {
            return Err(ClassifierError::Malformed("stub failure".to_string()));
        }
        Ok(self.canonical.clone())
    }

    async fn find_synonyms(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, String>, ClassifierError> {
        self.synonym_calls.lock().unwrap().push(names.to_vec());
        if self.fail {
            return Err(ClassifierError::Malformed("stub failure".to_string()));
        }
        Ok(self
            .synonyms
            .iter()
            .filter(|(old, _)| names.contains(old))
            .map(|(old, new)| (old.clone(), new.clone()))
            .collect())
    }
}
