//! Public job search over optional criteria.
//!
//! Every search starts from the accepting-applications predicate and ANDs one
//! clause per supplied criterion. A `min_salary` of N matches a job whose max
//! OR min salary reaches N; `max_salary` mirrors it. The skills filter needs
//! any one of the listed skills.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::catalog::companies::escape_like;
use crate::errors::{AppError, FieldErrors};
use crate::models::job::{EmploymentType, ExperienceLevel, JobListing, JobResource, JobStatus};
use crate::response::{Page, Paginated};

const LISTING_SELECT: &str = r#"
SELECT j.*, c.name AS company_name, cat.name AS category_name, l.name AS location_name
FROM jobs j
JOIN companies c ON c.id = j.company_id
JOIN categories cat ON cat.id = j.category_id
LEFT JOIN locations l ON l.id = j.location_id"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSort {
    #[default]
    Latest,
    Salary,
    Relevance,
}

/// Search criteria from the query string. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearchCriteria {
    #[serde(alias = "keyword", alias = "search")]
    pub title: Option<String>,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
    pub is_remote: Option<bool>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    /// Comma-separated skill ids.
    pub skills: Option<String>,
    #[serde(default, alias = "sort_by")]
    pub sort: JobSort,
}

impl JobSearchCriteria {
    pub fn skill_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let Some(raw) = self.skills.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Uuid::parse_str(s).map_err(|_| {
                    AppError::Validation(FieldErrors::single(
                        "skills",
                        format!("'{s}' is not a valid skill id"),
                    ))
                })
            })
            .collect()
    }

    /// Row-level form of the salary clauses `push_filters` emits. A missing
    /// bound on the job never satisfies a comparison, as in SQL.
    pub fn admits_salary(&self, job_min: Option<i64>, job_max: Option<i64>) -> bool {
        let reaches = |n: i64| job_max.is_some_and(|m| m >= n) || job_min.is_some_and(|m| m >= n);
        let within = |n: i64| job_min.is_some_and(|m| m <= n) || job_max.is_some_and(|m| m <= n);
        self.min_salary.map_or(true, reaches) && self.max_salary.map_or(true, within)
    }

    fn title_term(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// `status = active AND positions_available > 0 AND (no deadline OR deadline ahead)`
pub fn push_accepting_applications(qb: &mut QueryBuilder<'_, Postgres>, alias: &str) {
    qb.push(format!(
        "{a}.status = 'active' AND {a}.positions_available > 0 \
         AND ({a}.application_deadline IS NULL OR {a}.application_deadline > NOW())",
        a = alias
    ));
}

/// Pushes ` WHERE <accepting> [AND <criterion>]...` for the `j` alias.
pub fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    criteria: &JobSearchCriteria,
    skill_ids: &[Uuid],
) {
    qb.push(" WHERE ");
    push_accepting_applications(qb, "j");

    if let Some(title) = criteria.title_term() {
        qb.push(" AND j.title ILIKE ")
            .push_bind(format!("%{}%", escape_like(title)));
    }
    if let Some(id) = criteria.category_id {
        qb.push(" AND j.category_id = ").push_bind(id);
    }
    if let Some(id) = criteria.location_id {
        qb.push(" AND j.location_id = ").push_bind(id);
    }
    if let Some(id) = criteria.company_id {
        qb.push(" AND j.company_id = ").push_bind(id);
    }
    if let Some(kind) = criteria.employment_type {
        qb.push(" AND j.employment_type = ").push_bind(kind);
    }
    if let Some(level) = criteria.experience_level {
        qb.push(" AND j.experience_level = ").push_bind(level);
    }
    if let Some(remote) = criteria.is_remote {
        qb.push(" AND j.is_remote = ").push_bind(remote);
    }
    if let Some(min) = criteria.min_salary {
        qb.push(" AND (j.max_salary >= ")
            .push_bind(min)
            .push(" OR j.min_salary >= ")
            .push_bind(min)
            .push(")");
    }
    if let Some(max) = criteria.max_salary {
        qb.push(" AND (j.min_salary <= ")
            .push_bind(max)
            .push(" OR j.max_salary <= ")
            .push_bind(max)
            .push(")");
    }
    if !skill_ids.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM skillables sk WHERE sk.skillable_type = 'job' \
             AND sk.skillable_id = j.id AND sk.skill_id = ANY(",
        )
        .push_bind(skill_ids.to_vec())
        .push("))");
    }
}

/// Relevance is a three-level tie-break on the raw flags, not a score.
pub fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: JobSort) {
    qb.push(match sort {
        JobSort::Latest => " ORDER BY j.created_at DESC, j.id",
        JobSort::Salary => " ORDER BY COALESCE(j.min_salary, 0) DESC, j.created_at DESC, j.id",
        JobSort::Relevance => {
            " ORDER BY j.is_featured DESC, j.is_premium DESC, j.created_at DESC, j.id"
        }
    });
}

pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Page) {
    qb.push(" LIMIT ")
        .push_bind(page.per_page)
        .push(" OFFSET ")
        .push_bind(page.offset());
}

/// Public search. Read-only.
pub async fn search_jobs(
    pool: &PgPool,
    criteria: &JobSearchCriteria,
    page: Page,
) -> Result<Paginated<JobResource>, AppError> {
    let skill_ids = criteria.skill_ids()?;

    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM jobs j");
    push_filters(&mut count, criteria, &skill_ids);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut rows = QueryBuilder::new(LISTING_SELECT);
    push_filters(&mut rows, criteria, &skill_ids);
    push_order(&mut rows, criteria.sort);
    push_page(&mut rows, page);
    let listings = rows.build_query_as::<JobListing>().fetch_all(pool).await?;
    debug_assert!(listings
        .iter()
        .all(|l| criteria.admits_salary(l.job.min_salary, l.job.max_salary)));

    let now = Utc::now();
    let data = listings
        .into_iter()
        .map(|l| JobResource::at(l, now))
        .collect();
    Ok(Paginated::new(data, page, total))
}

/// The caller's own postings in any status, newest first.
pub async fn list_owned_jobs(
    pool: &PgPool,
    owner_id: Uuid,
    status: Option<JobStatus>,
    page: Page,
) -> Result<Paginated<JobResource>, AppError> {
    fn push_owner(qb: &mut QueryBuilder<'_, Postgres>, owner_id: Uuid, status: Option<JobStatus>) {
        qb.push(" WHERE j.user_id = ").push_bind(owner_id);
        if let Some(status) = status {
            qb.push(" AND j.status = ").push_bind(status);
        }
    }

    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM jobs j");
    push_owner(&mut count, owner_id, status);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut rows = QueryBuilder::new(LISTING_SELECT);
    push_owner(&mut rows, owner_id, status);
    push_order(&mut rows, JobSort::Latest);
    push_page(&mut rows, page);
    let listings = rows.build_query_as::<JobListing>().fetch_all(pool).await?;

    let now = Utc::now();
    let data = listings
        .into_iter()
        .map(|l| JobResource::at(l, now))
        .collect();
    Ok(Paginated::new(data, page, total))
}

/// One job with its display names, regardless of status.
pub async fn find_listing(pool: &PgPool, id: Uuid) -> Result<JobListing, AppError> {
    let mut qb = QueryBuilder::new(LISTING_SELECT);
    qb.push(" WHERE j.id = ").push_bind(id);
    qb.build_query_as::<JobListing>()
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}
