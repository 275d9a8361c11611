//! Creating, updating, closing and deleting job postings, plus the counted
//! detail view.
//!
//! Authorization is checked here, after the job is loaded and before anything
//! is written: only the posting's owner or an admin may mutate it. Every
//! multi-row mutation runs in one transaction; an early `?` drops the
//! transaction and rolls it back.

use chrono::Utc;
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::activity::{self, Activity};
use crate::auth::AuthUser;
use crate::catalog::companies::find_company;
use crate::catalog::locations::find_or_create_location;
use crate::catalog::skills::{attached_skills, detach_all, sync_skills};
use crate::errors::{AppError, FieldErrors};
use crate::jobs::search::find_listing;
use crate::jobs::validation::{
    validate_update, JobChanges, NewJob, UpdateJobRequest, WindowToggleRequest,
};
use crate::models::catalog::{AttachedSkill, SkillableType};
use crate::models::job::{Job, JobResource, JobStatus};

/// Job detail: the resolved resource plus its skills.
#[derive(Debug, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: JobResource,
    pub skills: Vec<AttachedSkill>,
}

/// The two flag-plus-expiry windows a posting carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Featured,
    Premium,
}

impl Window {
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            Window::Featured => ("is_featured", "featured_until"),
            Window::Premium => ("is_premium", "premium_until"),
        }
    }

    fn current(self, job: &Job) -> bool {
        match self {
            Window::Featured => job.is_featured,
            Window::Premium => job.is_premium,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Window::Featured => "featured",
            Window::Premium => "premium",
        }
    }
}

pub async fn find_job(pool: &PgPool, id: Uuid) -> Result<Job, AppError> {
    sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

async fn ensure_category_exists(pool: &PgPool, category_id: Uuid) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(category_id)
        .fetch_one(pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::Validation(FieldErrors::single(
            "category_id",
            "The selected category is invalid",
        )))
    }
}

async fn resource(pool: &PgPool, id: Uuid) -> Result<JobResource, AppError> {
    Ok(JobResource::at(find_listing(pool, id).await?, Utc::now()))
}

/// Creates a posting for a company the caller owns (admins may post for any).
pub async fn create_job(pool: &PgPool, user: &AuthUser, new: NewJob) -> Result<JobResource, AppError> {
    user.require_employer_or_admin()?;
    let company = find_company(pool, new.company_id).await?;
    user.ensure_can_manage(company.user_id)?;
    ensure_category_exists(pool, new.category_id).await?;

    let mut tx = pool.begin().await?;

    let location_id = match &new.location {
        Some(city) => Some(find_or_create_location(&mut *tx, city).await?),
        None => None,
    };

    let job: Job = sqlx::query_as(
        r#"
        INSERT INTO jobs
            (company_id, user_id, title, description, category_id, location_id,
             employment_type, experience_level, is_remote, min_salary, max_salary,
             salary_currency, salary_period, status, positions_available,
             application_deadline, tags)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING *
        "#,
    )
    .bind(new.company_id)
    .bind(user.user_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.category_id)
    .bind(location_id)
    .bind(new.employment_type)
    .bind(new.experience_level)
    .bind(new.is_remote)
    .bind(new.min_salary)
    .bind(new.max_salary)
    .bind(&new.salary_currency)
    .bind(new.salary_period)
    .bind(new.status)
    .bind(new.positions_available)
    .bind(new.application_deadline)
    .bind(&new.tags)
    .fetch_one(&mut *tx)
    .await?;

    if !new.skills.is_empty() {
        sync_skills(&mut *tx, SkillableType::Job, job.id, &new.skills).await?;
    }

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id: Some(job.company_id),
            job_id: Some(job.id),
            action: "job.created",
            description: format!("Job '{}' posted", job.title),
        },
    )
    .await?;

    tx.commit().await?;
    info!("Job {} created by user {}", job.id, user.user_id);

    resource(pool, job.id).await
}

/// Pushes `SET` assignments for the supplied changes onto an `UPDATE jobs`.
/// `updated_at` is always bumped so the statement is never empty.
pub fn push_job_changes(
    qb: &mut QueryBuilder<'_, Postgres>,
    changes: &JobChanges,
    location_id: Option<Uuid>,
) {
    qb.push(" SET updated_at = NOW()");
    if let Some(v) = &changes.title {
        qb.push(", title = ").push_bind(v.clone());
    }
    if let Some(v) = &changes.description {
        qb.push(", description = ").push_bind(v.clone());
    }
    if let Some(v) = changes.category_id {
        qb.push(", category_id = ").push_bind(v);
    }
    if let Some(v) = location_id {
        qb.push(", location_id = ").push_bind(v);
    }
    if let Some(v) = changes.employment_type {
        qb.push(", employment_type = ").push_bind(v);
    }
    if let Some(v) = changes.experience_level {
        qb.push(", experience_level = ").push_bind(v);
    }
    if let Some(v) = changes.is_remote {
        qb.push(", is_remote = ").push_bind(v);
    }
    if let Some(v) = changes.min_salary {
        qb.push(", min_salary = ").push_bind(v);
    }
    if let Some(v) = changes.max_salary {
        qb.push(", max_salary = ").push_bind(v);
    }
    if let Some(v) = &changes.salary_currency {
        qb.push(", salary_currency = ").push_bind(v.clone());
    }
    if let Some(v) = changes.salary_period {
        qb.push(", salary_period = ").push_bind(v);
    }
    if let Some(v) = changes.status {
        qb.push(", status = ").push_bind(v);
    }
    if let Some(v) = changes.positions_available {
        qb.push(", positions_available = ").push_bind(v);
    }
    if let Some(v) = changes.application_deadline {
        qb.push(", application_deadline = ").push_bind(v);
    }
    if let Some(v) = &changes.tags {
        qb.push(", tags = ").push_bind(v.clone());
    }
}

/// Applies only the supplied fields. Skills, when supplied, replace the set.
pub async fn update_job(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
    req: &UpdateJobRequest,
) -> Result<JobResource, AppError> {
    let job = find_job(pool, id).await?;
    user.ensure_can_manage(job.user_id)?;

    let changes = validate_update(req, &job, Utc::now())?;
    if let Some(category_id) = changes.category_id {
        ensure_category_exists(pool, category_id).await?;
    }

    let mut tx = pool.begin().await?;

    let location_id = match &changes.location {
        Some(city) => Some(find_or_create_location(&mut *tx, city).await?),
        None => None,
    };

    let mut qb = QueryBuilder::new("UPDATE jobs");
    push_job_changes(&mut qb, &changes, location_id);
    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(&mut *tx).await?;

    if let Some(skills) = &changes.skills {
        sync_skills(&mut *tx, SkillableType::Job, id, skills).await?;
    }

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id: Some(job.company_id),
            job_id: Some(id),
            action: "job.updated",
            description: format!("Job '{}' updated", job.title),
        },
    )
    .await?;

    tx.commit().await?;
    info!("Job {id} updated by user {}", user.user_id);

    resource(pool, id).await
}

/// Sets or flips a featured/premium flag. Turning a flag off clears its expiry.
pub async fn toggle_window(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
    window: Window,
    req: &WindowToggleRequest,
) -> Result<JobResource, AppError> {
    let job = find_job(pool, id).await?;
    user.ensure_can_manage(job.user_id)?;

    let flag = req.value.unwrap_or(!window.current(&job));
    let until = if flag { req.until } else { None };
    let (flag_col, until_col) = window.columns();

    let mut tx = pool.begin().await?;

    sqlx::query(&format!(
        "UPDATE jobs SET {flag_col} = $1, {until_col} = $2, updated_at = NOW() WHERE id = $3"
    ))
    .bind(flag)
    .bind(until)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id: Some(job.company_id),
            job_id: Some(id),
            action: if flag { "job.window_on" } else { "job.window_off" },
            description: format!(
                "Job '{}' {} {}",
                job.title,
                window.label(),
                if flag { "enabled" } else { "disabled" }
            ),
        },
    )
    .await?;

    tx.commit().await?;
    info!("Job {id} {} set to {flag}", window.label());

    resource(pool, id).await
}

/// One-way transition to `closed`. Closing a closed job is a no-op success.
pub async fn close_job(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<JobResource, AppError> {
    let job = find_job(pool, id).await?;
    user.ensure_can_manage(job.user_id)?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE jobs SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(JobStatus::Closed)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id: Some(job.company_id),
            job_id: Some(id),
            action: "job.closed",
            description: format!("Job '{}' closed", job.title),
        },
    )
    .await?;

    tx.commit().await?;
    info!("Job {id} closed by user {}", user.user_id);

    resource(pool, id).await
}

/// Hard delete. Applications go first, in the same transaction, so no
/// application is ever left pointing at a missing job.
pub async fn delete_job(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<u64, AppError> {
    let job = find_job(pool, id).await?;
    user.ensure_can_manage(job.user_id)?;

    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM job_applications WHERE job_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    detach_all(&mut *tx, SkillableType::Job, id).await?;

    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id: Some(job.company_id),
            job_id: Some(id),
            action: "job.deleted",
            description: format!("Job '{}' deleted with {removed} application(s)", job.title),
        },
    )
    .await?;

    tx.commit().await?;
    info!("Job {id} deleted by user {} ({removed} applications removed)", user.user_id);

    Ok(removed)
}

/// Public detail view. Counts the view atomically and appends a view row.
/// Drafts are only visible to their owner or an admin.
pub async fn view_job(
    pool: &PgPool,
    id: Uuid,
    viewer: Option<&AuthUser>,
) -> Result<JobDetail, AppError> {
    let mut listing = find_listing(pool, id).await?;
    if listing.job.status == JobStatus::Draft
        && !viewer.is_some_and(|v| v.can_manage(listing.job.user_id))
    {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }

    let mut tx = pool.begin().await?;

    let views: i64 = sqlx::query_scalar(
        "UPDATE jobs SET views_count = views_count + 1 WHERE id = $1 RETURNING views_count",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO job_views (job_id, user_id) VALUES ($1, $2)")
        .bind(id)
        .bind(viewer.map(|v| v.user_id))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    listing.job.views_count = views;
    let skills = attached_skills(pool, SkillableType::Job, id).await?;
    Ok(JobDetail {
        job: JobResource::at(listing, Utc::now()),
        skills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{fixtures::job, EmploymentType};

    fn update_sql(changes: &JobChanges, location_id: Option<Uuid>) -> String {
        let mut qb = QueryBuilder::new("UPDATE jobs");
        push_job_changes(&mut qb, changes, location_id);
        qb.push(" WHERE id = ").push_bind(Uuid::nil());
        qb.sql().to_string()
    }

    #[test]
    fn test_empty_update_only_touches_timestamp() {
        assert_eq!(
            update_sql(&JobChanges::default(), None),
            "UPDATE jobs SET updated_at = NOW() WHERE id = $1"
        );
    }

    #[test]
    fn test_update_sets_only_supplied_columns() {
        let changes = JobChanges {
            title: Some("Staff Engineer".into()),
            employment_type: Some(EmploymentType::Contract),
            max_salary: Some(200_000),
            ..Default::default()
        };
        assert_eq!(
            update_sql(&changes, None),
            "UPDATE jobs SET updated_at = NOW(), title = $1, employment_type = $2, \
             max_salary = $3 WHERE id = $4"
        );
    }

    #[test]
    fn test_update_includes_resolved_location() {
        let sql = update_sql(&JobChanges::default(), Some(Uuid::new_v4()));
        assert!(sql.contains("location_id = $1"));
    }

    #[test]
    fn test_window_columns() {
        assert_eq!(Window::Featured.columns(), ("is_featured", "featured_until"));
        assert_eq!(Window::Premium.columns(), ("is_premium", "premium_until"));
    }

    #[test]
    fn test_window_reads_current_flag() {
        let mut j = job();
        j.is_premium = true;
        assert!(Window::Premium.current(&j));
        assert!(!Window::Featured.current(&j));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_delete_removes_every_application(pool: PgPool) {
        use crate::applications::lifecycle::{submit_application, SubmitApplicationRequest};
        use crate::models::user::UserType;
        use crate::testing::{account, count, posting};

        let employer = account(&pool, UserType::Employer).await;
        let id = posting(&pool, &employer, None, None).await;
        for _ in 0..2 {
            let seeker = account(&pool, UserType::Jobseeker).await;
            submit_application(&pool, &seeker, id, &SubmitApplicationRequest::default())
                .await
                .unwrap();
        }

        assert_eq!(delete_job(&pool, &employer, id).await.unwrap(), 2);
        let left = count(&pool, "SELECT COUNT(*) FROM job_applications WHERE job_id = $1", id).await;
        assert_eq!(left, 0);
        assert!(matches!(find_job(&pool, id).await, Err(AppError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_concurrent_views_are_both_counted(pool: PgPool) {
        use crate::models::user::UserType;
        use crate::testing::{account, count, posting};

        let employer = account(&pool, UserType::Employer).await;
        let id = posting(&pool, &employer, None, None).await;
        sqlx::query("UPDATE jobs SET views_count = 5 WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let (a, b) = tokio::join!(view_job(&pool, id, None), view_job(&pool, id, None));
        let mut seen = [a.unwrap().job.listing.job.views_count, b.unwrap().job.listing.job.views_count];
        seen.sort_unstable();
        assert_eq!(seen, [6, 7]);

        assert_eq!(count(&pool, "SELECT views_count FROM jobs WHERE id = $1", id).await, 7);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM job_views WHERE job_id = $1", id).await, 2);
    }
}
