use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A `skills` row exactly as stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillRow {
    pub id: Uuid,
    pub original_skill_name: String,
    pub canonical_skill_name: Option<String>,
    pub category: Option<String>,
}

/// Whether a row still waits for the canonicalizer.
///
/// At most one `Pending` row exists per raw string. `Canonical` rows may fan out,
/// but never repeat the same (original, canonical) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "name", rename_all = "snake_case")]
pub enum SkillState {
    Pending,
    Canonical(String),
}

impl SkillState {
    pub fn canonical(&self) -> Option<&str> {
        match self {
            SkillState::Pending => None,
            SkillState::Canonical(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: Uuid,
    pub original_skill_name: String,
    pub state: SkillState,
    pub category: Option<String>,
}

#[cfg(test)]
impl SkillRecord {
    pub fn canonical(id: Uuid, original: &str, canonical: &str) -> Self {
        Self {
            id,
            original_skill_name: original.to_string(),
            state: SkillState::Canonical(canonical.to_string()),
            category: None,
        }
    }
}

impl From<SkillRow> for SkillRecord {
    fn from(row: SkillRow) -> Self {
        let state = match row.canonical_skill_name {
            Some(name) => SkillState::Canonical(name),
            None => SkillState::Pending,
        };
        Self {
            id: row.id,
            original_skill_name: row.original_skill_name,
            state,
            category: row.category,
        }
    }
}

/// A row the canonicalizer will insert: a fan-out sibling of an existing raw string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSkill {
    pub original_skill_name: String,
    pub canonical_skill_name: String,
    pub category: Option<String>,
}
