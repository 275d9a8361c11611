use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only audit row. Never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
