use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::ActivityLog;

/// One audit entry to append.
#[derive(Debug, Clone, Default)]
pub struct Activity<'a> {
    pub user_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub action: &'a str,
    pub description: String,
}

/// Appends an activity row. Pass a transaction to keep it atomic with the
/// mutation it describes.
pub async fn record<'e, E: PgExecutor<'e>>(executor: E, activity: Activity<'_>) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO activity_logs (user_id, company_id, job_id, action, description)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(activity.user_id)
    .bind(activity.company_id)
    .bind(activity.job_id)
    .bind(activity.action)
    .bind(&activity.description)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<ActivityLog>, AppError> {
    Ok(sqlx::query_as::<_, ActivityLog>(
        "SELECT * FROM activity_logs ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?)
}
