use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::activity::{self, Activity};
use crate::auth::AuthUser;
use crate::catalog::companies::company_for_user;
use crate::errors::{AppError, FieldErrors};
use crate::settings::model::EmployerSettings;

/// The caller's settings with defaults applied. An unset company name is
/// filled from the owned company.
pub async fn get_employer_settings(
    pool: &PgPool,
    user: &AuthUser,
) -> Result<EmployerSettings, AppError> {
    user.require_employer()?;

    let doc: Value = sqlx::query_scalar("SELECT settings FROM user_profiles WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let mut settings = EmployerSettings::from_document(&doc)?;
    if settings.company_name().is_none() {
        settings.general.company_name = company_for_user(pool, user.user_id)
            .await?
            .map(|c| c.name);
    }
    Ok(settings)
}

/// Deep-merges `patch` onto the stored document and persists it. When a
/// company name is present the owned company is renamed in the same
/// transaction.
pub async fn update_employer_settings(
    pool: &PgPool,
    user: &AuthUser,
    patch: Value,
) -> Result<EmployerSettings, AppError> {
    user.require_employer()?;
    if !patch.is_object() {
        return Err(AppError::Validation(FieldErrors::single(
            "settings",
            "The settings must be a JSON object",
        )));
    }

    let mut tx = pool.begin().await?;

    let stored: Value = sqlx::query_scalar(
        "SELECT settings FROM user_profiles WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let (doc, settings) = EmployerSettings::apply_patch(stored, patch)?;

    sqlx::query("UPDATE user_profiles SET settings = $1, updated_at = NOW() WHERE user_id = $2")
        .bind(doc)
        .bind(user.user_id)
        .execute(&mut *tx)
        .await?;

    let mut company_id: Option<Uuid> = None;
    if let Some(name) = settings.company_name() {
        company_id = sqlx::query_scalar(
            "UPDATE companies SET name = $1, updated_at = NOW() WHERE user_id = $2 RETURNING id",
        )
        .bind(name)
        .bind(user.user_id)
        .fetch_optional(&mut *tx)
        .await?;
    }

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id,
            action: "settings.updated",
            description: format!("{} updated employer settings", user.name),
            ..Default::default()
        },
    )
    .await?;

    tx.commit().await?;
    info!("Employer settings updated for user {}", user.user_id);

    Ok(settings)
}
