use axum::extract::{Path, State};
use uuid::Uuid;

use crate::catalog::companies::{
    company_detail, list_categories, list_companies, CompanyDetail, CompanyFilter,
};
use crate::catalog::skills::list_skills;
use crate::errors::AppError;
use crate::models::catalog::{Category, Skill};
use crate::models::company::Company;
use crate::response::{ApiQuery, ApiResponse, PageParams, Paginated};
use crate::state::AppState;

/// GET /categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Category>>, AppError> {
    Ok(ApiResponse::ok(list_categories(&state.db).await?))
}

/// GET /skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Skill>>, AppError> {
    Ok(ApiResponse::ok(list_skills(&state.db).await?))
}

/// GET /companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CompanyFilter>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<ApiResponse<Paginated<Company>>, AppError> {
    let page = page.resolve(&state.config);
    Ok(ApiResponse::ok(list_companies(&state.db, &filter, page).await?))
}

/// GET /companies/:id
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CompanyDetail>, AppError> {
    Ok(ApiResponse::ok(company_detail(&state.db, id).await?))
}
