use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The slice of a crawled posting the taxonomy cares about.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OfferTagsRow {
    pub job_url: String,
    pub tech_stack: Option<String>,
    pub category: Option<String>,
}

/// A posting ↔ skill link. Unique per pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfferSkillEdge {
    pub job_url: String,
    pub skill_id: Uuid,
}
