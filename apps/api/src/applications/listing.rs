use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::applications::status::StatusScope;
use crate::auth::AuthUser;
use crate::catalog::companies::escape_like;
use crate::config::Config;
use crate::errors::AppError;
use crate::jobs::search::push_page;
use crate::models::application::{ApplicationListing, ApplicationStatus};
use crate::response::{Page, Paginated};

const LISTING_SELECT: &str = r#"
SELECT a.*, j.title AS job_title, j.company_id, c.name AS company_name,
       u.name AS applicant_name, u.email AS applicant_email
FROM job_applications a
JOIN jobs j ON j.id = a.job_id
JOIN companies c ON c.id = j.company_id
JOIN users u ON u.id = a.user_id"#;

const LISTING_FROM: &str = r#"
SELECT COUNT(*)
FROM job_applications a
JOIN jobs j ON j.id = a.job_id
JOIN users u ON u.id = a.user_id"#;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationFilter {
    /// Matches applicant name, applicant email or job title.
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub job_id: Option<Uuid>,
    pub is_favorite: Option<bool>,
    pub page: Option<i64>,
    /// Page size; `per_page` is accepted too.
    #[serde(alias = "per_page")]
    pub limit: Option<i64>,
}

impl ApplicationFilter {
    pub fn page(&self, config: &Config) -> Page {
        Page::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(config.default_page_size),
            config.max_page_size,
        )
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Pushes the WHERE clause. Applicants see their own applications, employers
/// the applications to their postings, admins everything.
pub fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    viewer: &AuthUser,
    scope: StatusScope,
    filter: &ApplicationFilter,
) {
    qb.push(" WHERE TRUE");
    match scope {
        StatusScope::Applicant => {
            qb.push(" AND a.user_id = ").push_bind(viewer.user_id);
        }
        StatusScope::Employer if !viewer.is_admin() => {
            qb.push(" AND j.user_id = ").push_bind(viewer.user_id);
        }
        StatusScope::Employer | StatusScope::Admin => {}
    }

    if let Some(term) = filter.search_term() {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.title ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = filter.status {
        qb.push(" AND a.status = ").push_bind(status);
    }
    if let Some(job_id) = filter.job_id {
        qb.push(" AND a.job_id = ").push_bind(job_id);
    }
    if let Some(favorite) = filter.is_favorite {
        qb.push(" AND a.is_favorite = ").push_bind(favorite);
    }
}

pub async fn list_applications(
    pool: &PgPool,
    viewer: &AuthUser,
    scope: StatusScope,
    filter: &ApplicationFilter,
    page: Page,
) -> Result<Paginated<ApplicationListing>, AppError> {
    let mut count = QueryBuilder::new(LISTING_FROM);
    push_filters(&mut count, viewer, scope, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut rows = QueryBuilder::new(LISTING_SELECT);
    push_filters(&mut rows, viewer, scope, filter);
    rows.push(" ORDER BY a.created_at DESC, a.id");
    push_page(&mut rows, page);
    let data = rows
        .build_query_as::<ApplicationListing>()
        .fetch_all(pool)
        .await?;

    Ok(Paginated::new(data, page, total))
}

/// One application with display fields. Visible to its applicant, the job's
/// owner and admins; anyone else gets 403.
pub async fn get_application(
    pool: &PgPool,
    viewer: &AuthUser,
    id: Uuid,
) -> Result<ApplicationListing, AppError> {
    let mut qb = QueryBuilder::new(LISTING_SELECT);
    qb.push(" WHERE a.id = ").push_bind(id);
    let listing = qb
        .build_query_as::<ApplicationListing>()
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    if listing.application.user_id == viewer.user_id || viewer.is_admin() {
        return Ok(listing);
    }
    let owner: Uuid = sqlx::query_scalar("SELECT user_id FROM jobs WHERE id = $1")
        .bind(listing.application.job_id)
        .fetch_one(pool)
        .await?;
    viewer.ensure_can_manage(owner)?;
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::context::user;
    use crate::models::user::UserType;

    fn sql(viewer: &AuthUser, scope: StatusScope, filter: &ApplicationFilter) -> String {
        let mut qb = QueryBuilder::new("");
        push_filters(&mut qb, viewer, scope, filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_applicant_sees_only_own() {
        let s = sql(&user(UserType::Jobseeker), StatusScope::Applicant, &Default::default());
        assert_eq!(s, " WHERE TRUE AND a.user_id = $1");
    }

    #[test]
    fn test_employer_scoped_to_own_jobs() {
        let s = sql(&user(UserType::Employer), StatusScope::Employer, &Default::default());
        assert_eq!(s, " WHERE TRUE AND j.user_id = $1");
    }

    #[test]
    fn test_admin_is_unscoped() {
        let admin = user(UserType::Admin);
        assert_eq!(sql(&admin, StatusScope::Admin, &Default::default()), " WHERE TRUE");
        assert_eq!(sql(&admin, StatusScope::Employer, &Default::default()), " WHERE TRUE");
    }

    #[test]
    fn test_search_spans_applicant_and_job() {
        let filter = ApplicationFilter {
            search: Some("ada".into()),
            status: Some(ApplicationStatus::Shortlisted),
            ..Default::default()
        };
        let s = sql(&user(UserType::Admin), StatusScope::Admin, &filter);
        assert_eq!(
            s,
            " WHERE TRUE AND (u.name ILIKE $1 OR u.email ILIKE $2 OR j.title ILIKE $3) \
             AND a.status = $4"
        );
    }

    #[test]
    fn test_filter_from_query_string() {
        let filter: ApplicationFilter =
            serde_urlencoded::from_str("status=reviewed&per_page=5&page=2").unwrap();
        assert_eq!(filter.status, Some(ApplicationStatus::Reviewed));
        let page = filter.page(&Config::default());
        assert_eq!(page, Page { page: 2, per_page: 5 });
    }

    #[test]
    fn test_limit_clamped_to_max() {
        let filter = ApplicationFilter {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.page(&Config::default()).per_page, 100);
    }
}
