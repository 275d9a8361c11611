use axum::extract::{Path, State};
use uuid::Uuid;

use crate::applications::lifecycle::{
    change_status, delete_application, set_candidate_notes, set_employer_notes, set_rating,
    submit_application, toggle_favorite, NotesRequest, RatingRequest, StatusRequest,
    SubmitApplicationRequest,
};
use crate::applications::listing::{get_application, list_applications, ApplicationFilter};
use crate::applications::status::StatusScope;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::application::{ApplicationListing, ApplicationStatus, JobApplication};
use crate::response::{ApiJson, ApiQuery, ApiResponse, JsonOrDefault, Paginated};
use crate::state::AppState;

// ── Applicant ────────────────────────────────────────────────────────────────

/// POST /jobs/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
    JsonOrDefault(req): JsonOrDefault<SubmitApplicationRequest>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    let application = submit_application(&state.db, &user, job_id, &req).await?;
    Ok(ApiResponse::created(application).with_message("Application submitted successfully"))
}

/// GET /applications
pub async fn handle_list_my_applications(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<ApplicationFilter>,
) -> Result<ApiResponse<Paginated<ApplicationListing>>, AppError> {
    let page = filter.page(&state.config);
    let data = list_applications(&state.db, &user, StatusScope::Applicant, &filter, page).await?;
    Ok(ApiResponse::ok(data))
}

/// GET /applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ApplicationListing>, AppError> {
    Ok(ApiResponse::ok(get_application(&state.db, &user, id).await?))
}

/// POST /applications/:id/withdraw
pub async fn handle_withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    let application = change_status(
        &state.db,
        &user,
        id,
        StatusScope::Applicant,
        ApplicationStatus::Withdrawn,
    )
    .await?;
    Ok(ApiResponse::ok(application).with_message("Application withdrawn"))
}

/// PUT /applications/:id/notes
pub async fn handle_candidate_notes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<NotesRequest>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    let application = set_candidate_notes(&state.db, &user, id, req.notes.as_deref()).await?;
    Ok(ApiResponse::ok(application).with_message("Notes updated"))
}

/// DELETE /applications/:id
pub async fn handle_delete_own(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    delete_application(&state.db, &user, id, StatusScope::Applicant).await?;
    Ok(ApiResponse::message("Application deleted successfully"))
}

// ── Employer ─────────────────────────────────────────────────────────────────

/// GET /employer/applications
pub async fn handle_list_received(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<ApplicationFilter>,
) -> Result<ApiResponse<Paginated<ApplicationListing>>, AppError> {
    user.require_employer_or_admin()?;
    let page = filter.page(&state.config);
    let data = list_applications(&state.db, &user, StatusScope::Employer, &filter, page).await?;
    Ok(ApiResponse::ok(data))
}

/// PUT /employer/applications/:id/status
pub async fn handle_employer_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    user.require_employer_or_admin()?;
    let target = StatusScope::Employer.parse_target(&req.status)?;
    let application = change_status(&state.db, &user, id, StatusScope::Employer, target).await?;
    Ok(ApiResponse::ok(application).with_message("Application status updated"))
}

/// PUT /employer/applications/:id/notes
pub async fn handle_employer_notes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<NotesRequest>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    user.require_employer_or_admin()?;
    let application = set_employer_notes(&state.db, &user, id, req.notes.as_deref()).await?;
    Ok(ApiResponse::ok(application).with_message("Notes updated"))
}

/// PUT /employer/applications/:id/rating
pub async fn handle_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<RatingRequest>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    user.require_employer_or_admin()?;
    let application = set_rating(&state.db, &user, id, req.rating).await?;
    Ok(ApiResponse::ok(application).with_message("Rating updated"))
}

/// POST /employer/applications/:id/favorite
pub async fn handle_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    user.require_employer_or_admin()?;
    let application = toggle_favorite(&state.db, &user, id).await?;
    let message = if application.is_favorite {
        "Added to favorites"
    } else {
        "Removed from favorites"
    };
    Ok(ApiResponse::ok(application).with_message(message))
}

/// DELETE /employer/applications/:id
pub async fn handle_employer_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    user.require_employer_or_admin()?;
    delete_application(&state.db, &user, id, StatusScope::Employer).await?;
    Ok(ApiResponse::message("Application deleted successfully"))
}

// ── Admin ────────────────────────────────────────────────────────────────────

/// GET /admin/applications
pub async fn handle_admin_list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<ApplicationFilter>,
) -> Result<ApiResponse<Paginated<ApplicationListing>>, AppError> {
    user.require_admin()?;
    let page = filter.page(&state.config);
    let data = list_applications(&state.db, &user, StatusScope::Admin, &filter, page).await?;
    Ok(ApiResponse::ok(data))
}

/// PUT /admin/applications/:id/status
pub async fn handle_admin_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<ApiResponse<JobApplication>, AppError> {
    user.require_admin()?;
    let target = StatusScope::Admin.parse_target(&req.status)?;
    let application = change_status(&state.db, &user, id, StatusScope::Admin, target).await?;
    Ok(ApiResponse::ok(application).with_message("Application status updated"))
}

/// DELETE /admin/applications/:id
pub async fn handle_admin_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    user.require_admin()?;
    delete_application(&state.db, &user, id, StatusScope::Admin).await?;
    Ok(ApiResponse::message("Application deleted successfully"))
}
