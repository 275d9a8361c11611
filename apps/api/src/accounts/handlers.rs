use axum::extract::State;
use axum::http::HeaderMap;

use crate::accounts::service::{
    login, logout, me, register, sync_profile_skills, update_profile, Account, Session,
};
use crate::accounts::validation::{
    validate_register, LoginRequest, ProfileSkillsRequest, ProfileUpdateRequest, RegisterRequest,
};
use crate::auth::context::bearer_token;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::catalog::AttachedSkill;
use crate::response::{ApiJson, ApiResponse};
use crate::state::AppState;

/// POST /auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<Session>, AppError> {
    let account = validate_register(&req)?;
    let session = register(&state.db, &state.config, account).await?;
    Ok(ApiResponse::created(session).with_message("Registration successful"))
}

/// POST /auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<ApiResponse<Session>, AppError> {
    let session = login(&state.db, &state.config, &req).await?;
    Ok(ApiResponse::ok(session).with_message("Login successful"))
}

/// POST /auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
) -> Result<ApiResponse<()>, AppError> {
    if let Some(token) = bearer_token(&headers) {
        logout(&state.db, token).await?;
    }
    Ok(ApiResponse::message("Logged out successfully"))
}

/// GET /auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Account>, AppError> {
    Ok(ApiResponse::ok(me(&state.db, &user).await?))
}

/// PUT /profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ProfileUpdateRequest>,
) -> Result<ApiResponse<Account>, AppError> {
    let account = update_profile(&state.db, &user, &req).await?;
    Ok(ApiResponse::ok(account).with_message("Profile updated successfully"))
}

/// PUT /profile/skills
pub async fn handle_sync_skills(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ProfileSkillsRequest>,
) -> Result<ApiResponse<Vec<AttachedSkill>>, AppError> {
    let skills = sync_profile_skills(&state.db, &user, &req).await?;
    Ok(ApiResponse::ok(skills).with_message("Skills updated successfully"))
}
