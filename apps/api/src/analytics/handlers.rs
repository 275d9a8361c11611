use axum::extract::State;

use crate::analytics::dashboard::{admin_dashboard, AdminDashboard};
use crate::analytics::employer::{employer_analytics, EmployerAnalytics};
use crate::analytics::period::PeriodQuery;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::response::{ApiQuery, ApiResponse};
use crate::state::AppState;

/// GET /admin/dashboard
pub async fn handle_admin_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<AdminDashboard>, AppError> {
    Ok(ApiResponse::ok(admin_dashboard(&state.db, &user).await?))
}

/// GET /analytics/employer?period=7d|30d|90d|1y
pub async fn handle_employer_analytics(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> Result<ApiResponse<EmployerAnalytics>, AppError> {
    let analytics =
        employer_analytics(&state.db, state.insights.as_ref(), &user, query.period()).await?;
    Ok(ApiResponse::ok(analytics))
}
