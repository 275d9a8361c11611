//! Submitting, updating and deleting job applications.
//!
//! A (job, user) pair has at most one application: duplicates are refused up
//! front and the unique constraint backs that up under races. Submission and
//! every delete keep the job's denormalized `applications_count` in step using
//! single-statement increments inside the same transaction.

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::activity::{self, Activity};
use crate::applications::status::StatusScope;
use crate::auth::AuthUser;
use crate::errors::{AppError, FieldErrors};
use crate::jobs::lifecycle::find_job;
use crate::models::application::{ApplicationStatus, JobApplication};
use crate::models::job::Job;

const MAX_COVER_LETTER_LEN: usize = 5000;
const MAX_NOTES_LEN: usize = 5000;

#[derive(Debug, Default, Deserialize)]
pub struct SubmitApplicationRequest {
    pub cover_letter: Option<String>,
    /// Stored resume reference. Falls back to the applicant's profile resume.
    pub resume_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(alias = "employer_notes", alias = "candidate_notes")]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: i64,
}

fn check_len(value: Option<&str>, max: usize, field: &str) -> Result<(), AppError> {
    if value.is_some_and(|v| v.chars().count() > max) {
        return Err(AppError::Validation(FieldErrors::single(
            field,
            format!("The {field} may not be greater than {max} characters"),
        )));
    }
    Ok(())
}

/// Ratings are 1 to 5 and independent of status.
pub fn validate_rating(rating: i64) -> Result<i16, AppError> {
    if (1..=5).contains(&rating) {
        Ok(rating as i16)
    } else {
        Err(AppError::Validation(FieldErrors::single(
            "rating",
            "The rating must be between 1 and 5",
        )))
    }
}

pub async fn find_application(pool: &PgPool, id: Uuid) -> Result<JobApplication, AppError> {
    sqlx::query_as::<_, JobApplication>("SELECT * FROM job_applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

/// Loads an application and its job, then checks the caller may act on it
/// in `scope`. Missing rows are 404; lack of rights is 403.
async fn load_for(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
    scope: StatusScope,
) -> Result<(JobApplication, Job), AppError> {
    let application = find_application(pool, id).await?;
    let job = find_job(pool, application.job_id).await?;
    match scope {
        StatusScope::Admin => user.require_admin()?,
        StatusScope::Employer => user.ensure_can_manage(job.user_id)?,
        StatusScope::Applicant => {
            if application.user_id != user.user_id {
                return Err(AppError::Forbidden);
            }
        }
    }
    Ok((application, job))
}

pub async fn submit_application(
    pool: &PgPool,
    user: &AuthUser,
    job_id: Uuid,
    req: &SubmitApplicationRequest,
) -> Result<JobApplication, AppError> {
    user.require_jobseeker()?;
    check_len(req.cover_letter.as_deref(), MAX_COVER_LETTER_LEN, "cover_letter")?;

    let job = find_job(pool, job_id).await?;
    if !job.is_accepting_applications_at(Utc::now()) {
        return Err(AppError::UnprocessableEntity(
            "This job is no longer accepting applications".to_string(),
        ));
    }

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM job_applications WHERE job_id = $1 AND user_id = $2)",
    )
    .bind(job_id)
    .bind(user.user_id)
    .fetch_one(pool)
    .await?;
    if already {
        return Err(AppError::Conflict(
            "You have already applied for this job".to_string(),
        ));
    }

    let resume_path = match req.resume_path.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => Some(path.to_string()),
        None => sqlx::query_scalar::<_, Option<String>>(
            "SELECT resume_path FROM user_profiles WHERE user_id = $1",
        )
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?
        .flatten(),
    };

    let mut tx = pool.begin().await?;

    // A concurrent duplicate trips job_applications_job_user_key here and
    // surfaces as Conflict; the transaction then rolls back untouched.
    let application: JobApplication = sqlx::query_as(
        r#"
        INSERT INTO job_applications (job_id, user_id, status, cover_letter, resume_path)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(job_id)
    .bind(user.user_id)
    .bind(ApplicationStatus::Pending)
    .bind(req.cover_letter.as_deref())
    .bind(resume_path)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE jobs SET applications_count = applications_count + 1 WHERE id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id: Some(job.company_id),
            job_id: Some(job_id),
            action: "application.submitted",
            description: format!("{} applied for '{}'", user.name, job.title),
        },
    )
    .await?;

    tx.commit().await?;
    info!("Application {} submitted for job {job_id} by user {}", application.id, user.user_id);

    Ok(application)
}

/// Moves an application to `target`, stamping the status milestone.
pub async fn change_status(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
    scope: StatusScope,
    target: ApplicationStatus,
) -> Result<JobApplication, AppError> {
    let (application, job) = load_for(pool, user, id, scope).await?;
    scope.check_transition(application.status, target)?;

    let sql = match target.milestone_column() {
        Some(column) => format!(
            "UPDATE job_applications SET status = $1, {column} = NOW(), updated_at = NOW() \
             WHERE id = $2 RETURNING *"
        ),
        None => "UPDATE job_applications SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *"
            .to_string(),
    };

    let mut tx = pool.begin().await?;

    let updated: JobApplication = sqlx::query_as(&sql)
        .bind(target)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id: Some(job.company_id),
            job_id: Some(job.id),
            action: "application.status_changed",
            description: format!(
                "Application for '{}' moved from {} to {target}",
                job.title, application.status
            ),
        },
    )
    .await?;

    tx.commit().await?;
    info!("Application {id} status {} -> {target} by user {}", application.status, user.user_id);

    Ok(updated)
}

pub async fn set_employer_notes(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
    notes: Option<&str>,
) -> Result<JobApplication, AppError> {
    check_len(notes, MAX_NOTES_LEN, "notes")?;
    load_for(pool, user, id, StatusScope::Employer).await?;
    Ok(sqlx::query_as(
        "UPDATE job_applications SET employer_notes = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(notes)
    .bind(id)
    .fetch_one(pool)
    .await?)
}

pub async fn set_candidate_notes(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
    notes: Option<&str>,
) -> Result<JobApplication, AppError> {
    check_len(notes, MAX_NOTES_LEN, "notes")?;
    load_for(pool, user, id, StatusScope::Applicant).await?;
    Ok(sqlx::query_as(
        "UPDATE job_applications SET candidate_notes = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(notes)
    .bind(id)
    .fetch_one(pool)
    .await?)
}

pub async fn set_rating(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
    rating: i64,
) -> Result<JobApplication, AppError> {
    let rating = validate_rating(rating)?;
    load_for(pool, user, id, StatusScope::Employer).await?;
    Ok(sqlx::query_as(
        "UPDATE job_applications SET rating = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(rating)
    .bind(id)
    .fetch_one(pool)
    .await?)
}

pub async fn toggle_favorite(pool: &PgPool, user: &AuthUser, id: Uuid) -> Result<JobApplication, AppError> {
    load_for(pool, user, id, StatusScope::Employer).await?;
    Ok(sqlx::query_as(
        "UPDATE job_applications SET is_favorite = NOT is_favorite, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(pool)
    .await?)
}

/// Deletes one application and decrements its job's counter, never below zero.
pub async fn delete_application(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
    scope: StatusScope,
) -> Result<(), AppError> {
    let (application, job) = load_for(pool, user, id, scope).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM job_applications WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE jobs SET applications_count = GREATEST(applications_count - 1, 0) WHERE id = $1",
    )
    .bind(application.job_id)
    .execute(&mut *tx)
    .await?;

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.user_id),
            company_id: Some(job.company_id),
            job_id: Some(job.id),
            action: "application.deleted",
            description: format!("Application for '{}' deleted", job.title),
        },
    )
    .await?;

    tx.commit().await?;
    info!("Application {id} deleted by user {}", user.user_id);

    Ok(())
}
