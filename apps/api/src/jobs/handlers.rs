use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::errors::AppError;
use crate::jobs::lifecycle::{
    close_job, create_job, delete_job, toggle_window, update_job, view_job, JobDetail, Window,
};
use crate::jobs::search::{list_owned_jobs, search_jobs, JobSearchCriteria};
use crate::jobs::validation::{
    validate_create, CreateJobRequest, UpdateJobRequest, WindowToggleRequest,
};
use crate::models::job::{JobResource, JobStatus};
use crate::response::{ApiJson, ApiQuery, ApiResponse, JsonOrDefault, PageParams, Paginated};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OwnedJobsQuery {
    pub status: Option<JobStatus>,
}

/// GET /jobs
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    ApiQuery(criteria): ApiQuery<JobSearchCriteria>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<ApiResponse<Paginated<JobResource>>, AppError> {
    let page = page.resolve(&state.config);
    Ok(ApiResponse::ok(search_jobs(&state.db, &criteria, page).await?))
}

/// GET /jobs/:id
///
/// Counts as a view: not idempotent.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> Result<ApiResponse<JobDetail>, AppError> {
    Ok(ApiResponse::ok(view_job(&state.db, id, viewer.as_ref()).await?))
}

/// POST /jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateJobRequest>,
) -> Result<ApiResponse<JobResource>, AppError> {
    user.require_employer_or_admin()?;
    let new = validate_create(&req, Utc::now())?;
    let job = create_job(&state.db, &user, new).await?;
    Ok(ApiResponse::created(job).with_message("Job created successfully"))
}

/// PUT /jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateJobRequest>,
) -> Result<ApiResponse<JobResource>, AppError> {
    let job = update_job(&state.db, &user, id, &req).await?;
    Ok(ApiResponse::ok(job).with_message("Job updated successfully"))
}

/// DELETE /jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Value>, AppError> {
    let removed = delete_job(&state.db, &user, id).await?;
    Ok(
        ApiResponse::ok(json!({ "applications_deleted": removed }))
            .with_message("Job deleted successfully"),
    )
}

/// POST /jobs/:id/featured
pub async fn handle_toggle_featured(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonOrDefault(req): JsonOrDefault<WindowToggleRequest>,
) -> Result<ApiResponse<JobResource>, AppError> {
    let job = toggle_window(&state.db, &user, id, Window::Featured, &req).await?;
    Ok(ApiResponse::ok(job).with_message("Featured status updated"))
}

/// POST /jobs/:id/premium
pub async fn handle_toggle_premium(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonOrDefault(req): JsonOrDefault<WindowToggleRequest>,
) -> Result<ApiResponse<JobResource>, AppError> {
    let job = toggle_window(&state.db, &user, id, Window::Premium, &req).await?;
    Ok(ApiResponse::ok(job).with_message("Premium status updated"))
}

/// POST /jobs/:id/close
pub async fn handle_close_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<JobResource>, AppError> {
    let job = close_job(&state.db, &user, id).await?;
    Ok(ApiResponse::ok(job).with_message("Job closed successfully"))
}

/// GET /employer/jobs
pub async fn handle_list_owned_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<OwnedJobsQuery>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<ApiResponse<Paginated<JobResource>>, AppError> {
    user.require_employer_or_admin()?;
    let page = page.resolve(&state.config);
    Ok(ApiResponse::ok(
        list_owned_jobs(&state.db, user.user_id, query.status, page).await?,
    ))
}
