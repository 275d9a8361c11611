use axum::extract::State;
use serde_json::Value;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::response::{ApiJson, ApiResponse};
use crate::settings::model::EmployerSettings;
use crate::settings::service::{get_employer_settings, update_employer_settings};
use crate::state::AppState;

/// GET /settings/employer
pub async fn handle_get_employer_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<EmployerSettings>, AppError> {
    Ok(ApiResponse::ok(get_employer_settings(&state.db, &user).await?))
}

/// PUT /settings/employer
pub async fn handle_update_employer_settings(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(patch): ApiJson<Value>,
) -> Result<ApiResponse<EmployerSettings>, AppError> {
    let settings = update_employer_settings(&state.db, &user, patch).await?;
    Ok(ApiResponse::ok(settings).with_message("Settings updated successfully"))
}
