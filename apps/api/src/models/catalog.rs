use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Owner side of the polymorphic skill join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skillable_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkillableType {
    User,
    Job,
}

/// A skill as attached to a user or job, with the per-association metadata.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttachedSkill {
    pub skill_id: Uuid,
    pub name: String,
    pub proficiency_level: Option<String>,
    pub years_experience: Option<i32>,
}
