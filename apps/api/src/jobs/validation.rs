//! Request shapes for the job lifecycle and their boundary validation.
//!
//! Validation runs before any write. Absent and `null` fields are the same
//! thing here: an update can never clear a column by sending `null`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::catalog::skills::{validate_skill_refs, SkillRef};
use crate::errors::{AppError, FieldErrors};
use crate::models::job::{EmploymentType, ExperienceLevel, Job, JobStatus, SalaryPeriod};

const MAX_TITLE_LEN: usize = 255;
const MAX_TAG_LEN: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct CreateJobRequest {
    pub company_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Free-text city, resolved to a location row by slug.
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
    pub is_remote: Option<bool>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<SalaryPeriod>,
    pub status: Option<JobStatus>,
    pub positions_available: Option<i32>,
    pub application_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
}

/// A create request that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub company_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub is_remote: bool,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub salary_currency: String,
    pub salary_period: SalaryPeriod,
    pub status: JobStatus,
    pub positions_available: i32,
    pub application_deadline: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub skills: Vec<SkillRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
    pub is_remote: Option<bool>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<SalaryPeriod>,
    pub status: Option<JobStatus>,
    pub positions_available: Option<i32>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    /// When present, replaces the whole skill set.
    pub skills: Option<Vec<SkillRef>>,
}

/// Body of the featured/premium toggles. Without `value` the flag flips.
#[derive(Debug, Default, Deserialize)]
pub struct WindowToggleRequest {
    #[serde(alias = "is_featured", alias = "is_premium", alias = "featured", alias = "premium")]
    pub value: Option<bool>,
    pub until: Option<DateTime<Utc>>,
}

fn required<T: Clone>(value: &Option<T>, field: &str, errors: &mut FieldErrors) -> Option<T> {
    if value.is_none() {
        errors.add(field, format!("The {field} field is required"));
    }
    value.clone()
}

fn required_text(value: &Option<String>, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.add(field, format!("The {field} field is required"));
            None
        }
    }
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    if title.chars().count() > MAX_TITLE_LEN {
        errors.add("title", format!("The title may not be greater than {MAX_TITLE_LEN} characters"));
    }
}

fn check_salary(min: Option<i64>, max: Option<i64>, errors: &mut FieldErrors) {
    if min.is_some_and(|v| v < 0) {
        errors.add("min_salary", "The min salary must be at least 0");
    }
    if max.is_some_and(|v| v < 0) {
        errors.add("max_salary", "The max salary must be at least 0");
    }
    if let (Some(min), Some(max)) = (min, max) {
        if max < min {
            errors.add(
                "max_salary",
                "The max salary must be greater than or equal to min salary",
            );
        }
    }
}

fn normalize_currency(currency: &str, errors: &mut FieldErrors) -> Option<String> {
    let currency = currency.trim();
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(currency.to_ascii_uppercase())
    } else {
        errors.add("salary_currency", "The salary currency must be a 3-letter code");
        None
    }
}

fn check_positions(positions: i32, errors: &mut FieldErrors) {
    if positions < 1 {
        errors.add("positions_available", "The positions available must be at least 1");
    }
}

fn check_deadline(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>, errors: &mut FieldErrors) {
    if deadline.is_some_and(|d| d <= now) {
        errors.add(
            "application_deadline",
            "The application deadline must be a date in the future",
        );
    }
}

/// Trims, drops blanks and repeats, keeps first-seen order.
fn normalize_tags(tags: &[String], errors: &mut FieldErrors) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_LEN {
            errors.add("tags", format!("Each tag may not be greater than {MAX_TAG_LEN} characters"));
            continue;
        }
        if !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    out
}

pub fn validate_create(req: &CreateJobRequest, now: DateTime<Utc>) -> Result<NewJob, AppError> {
    let mut errors = FieldErrors::new();

    let company_id = required(&req.company_id, "company_id", &mut errors);
    let category_id = required(&req.category_id, "category_id", &mut errors);
    let title = required_text(&req.title, "title", &mut errors);
    let description = required_text(&req.description, "description", &mut errors);
    let employment_type = required(&req.employment_type, "employment_type", &mut errors);
    let experience_level = required(&req.experience_level, "experience_level", &mut errors);

    if let Some(title) = &title {
        check_title(title, &mut errors);
    }
    check_salary(req.min_salary, req.max_salary, &mut errors);
    let salary_currency = normalize_currency(req.salary_currency.as_deref().unwrap_or("USD"), &mut errors);
    let positions_available = req.positions_available.unwrap_or(1);
    check_positions(positions_available, &mut errors);
    check_deadline(req.application_deadline, now, &mut errors);
    let status = req.status.unwrap_or(JobStatus::Active);
    if status == JobStatus::Closed {
        errors.add("status", "A job cannot be created closed");
    }
    let tags = normalize_tags(&req.tags, &mut errors);
    validate_skill_refs(&req.skills, &mut errors);

    errors.into_result()?;

    // Every Option below is Some once `errors` came back empty.
    let (
        Some(company_id),
        Some(category_id),
        Some(title),
        Some(description),
        Some(employment_type),
        Some(experience_level),
        Some(salary_currency),
    ) = (
        company_id,
        category_id,
        title,
        description,
        employment_type,
        experience_level,
        salary_currency,
    )
    else {
        return Err(AppError::Internal(anyhow::anyhow!(
            "job validation passed with missing fields"
        )));
    };

    Ok(NewJob {
        company_id,
        category_id,
        title,
        description,
        location: req
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string),
        employment_type,
        experience_level,
        is_remote: req.is_remote.unwrap_or(false),
        min_salary: req.min_salary,
        max_salary: req.max_salary,
        salary_currency,
        salary_period: req.salary_period.unwrap_or(SalaryPeriod::Yearly),
        status,
        positions_available,
        application_deadline: req.application_deadline,
        tags,
        skills: req.skills.clone(),
    })
}

/// Column changes of a validated partial update. `None` leaves the column alone.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
    pub is_remote: Option<bool>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<SalaryPeriod>,
    pub status: Option<JobStatus>,
    pub positions_available: Option<i32>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub skills: Option<Vec<SkillRef>>,
}

/// Validates an update against the stored job; salary bounds are checked on
/// the merged result.
pub fn validate_update(
    req: &UpdateJobRequest,
    existing: &Job,
    now: DateTime<Utc>,
) -> Result<JobChanges, AppError> {
    let mut errors = FieldErrors::new();

    let title = match req.title.as_deref().map(str::trim) {
        Some("") => {
            errors.add("title", "The title field must not be empty");
            None
        }
        Some(t) => {
            check_title(t, &mut errors);
            Some(t.to_string())
        }
        None => None,
    };
    let description = match req.description.as_deref().map(str::trim) {
        Some("") => {
            errors.add("description", "The description field must not be empty");
            None
        }
        other => other.map(str::to_string),
    };

    check_salary(
        req.min_salary.or(existing.min_salary),
        req.max_salary.or(existing.max_salary),
        &mut errors,
    );
    let salary_currency = req
        .salary_currency
        .as_deref()
        .and_then(|c| normalize_currency(c, &mut errors));
    if let Some(p) = req.positions_available {
        check_positions(p, &mut errors);
    }
    check_deadline(req.application_deadline, now, &mut errors);
    let tags = req.tags.as_ref().map(|t| normalize_tags(t, &mut errors));
    if let Some(skills) = &req.skills {
        validate_skill_refs(skills, &mut errors);
    }

    errors.into_result()?;

    Ok(JobChanges {
        title,
        description,
        category_id: req.category_id,
        location: req
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string),
        employment_type: req.employment_type,
        experience_level: req.experience_level,
        is_remote: req.is_remote,
        min_salary: req.min_salary,
        max_salary: req.max_salary,
        salary_currency,
        salary_period: req.salary_period,
        status: req.status,
        positions_available: req.positions_available,
        application_deadline: req.application_deadline,
        tags,
        skills: req.skills.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::fixtures::job;
    use chrono::Duration;

    fn valid_request() -> CreateJobRequest {
        CreateJobRequest {
            company_id: Some(Uuid::new_v4()),
            category_id: Some(Uuid::new_v4()),
            title: Some("  Senior Rust Engineer ".into()),
            description: Some("Own the API".into()),
            employment_type: Some(EmploymentType::FullTime),
            experience_level: Some(ExperienceLevel::Senior),
            min_salary: Some(80_000),
            max_salary: Some(120_000),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_create_applies_defaults() {
        let job = validate_create(&valid_request(), Utc::now()).unwrap();
        assert_eq!(job.title, "Senior Rust Engineer");
        assert_eq!(job.salary_currency, "USD");
        assert_eq!(job.salary_period, SalaryPeriod::Yearly);
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.positions_available, 1);
        assert!(!job.is_remote);
    }

    #[test]
    fn test_missing_fields_reported_per_field() {
        let err = validate_create(&CreateJobRequest::default(), Utc::now()).unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        for field in [
            "company_id",
            "category_id",
            "title",
            "description",
            "employment_type",
            "experience_level",
        ] {
            assert!(errors.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_inverted_salary_rejected() {
        let mut req = valid_request();
        req.min_salary = Some(150_000);
        let err = validate_create(&req, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e.contains("max_salary")));
    }

    #[test]
    fn test_past_deadline_rejected_on_create() {
        let mut req = valid_request();
        req.application_deadline = Some(Utc::now() - Duration::days(1));
        assert!(validate_create(&req, Utc::now()).is_err());
    }

    #[test]
    fn test_currency_normalized() {
        let mut req = valid_request();
        req.salary_currency = Some("eur".into());
        assert_eq!(validate_create(&req, Utc::now()).unwrap().salary_currency, "EUR");
        req.salary_currency = Some("EURO".into());
        assert!(validate_create(&req, Utc::now()).is_err());
    }

    #[test]
    fn test_tags_deduplicated() {
        let mut req = valid_request();
        req.tags = vec!["Rust".into(), " rust ".into(), "".into(), "Tokio".into()];
        assert_eq!(
            validate_create(&req, Utc::now()).unwrap().tags,
            vec!["Rust".to_string(), "Tokio".to_string()]
        );
    }

    #[test]
    fn test_cannot_create_closed() {
        let mut req = valid_request();
        req.status = Some(JobStatus::Closed);
        assert!(validate_create(&req, Utc::now()).is_err());
    }

    #[test]
    fn test_update_checks_merged_salary() {
        // stored 80k..120k; raising only the minimum past the stored max fails
        let existing = job();
        let req = UpdateJobRequest {
            min_salary: Some(130_000),
            ..Default::default()
        };
        assert!(validate_update(&req, &existing, Utc::now()).is_err());

        let req = UpdateJobRequest {
            min_salary: Some(130_000),
            max_salary: Some(140_000),
            ..Default::default()
        };
        assert!(validate_update(&req, &existing, Utc::now()).is_ok());
    }

    #[test]
    fn test_update_null_fields_are_dropped() {
        let req: UpdateJobRequest = serde_json::from_value(serde_json::json!({
            "title": "Staff Engineer",
            "description": null,
            "min_salary": null
        }))
        .unwrap();
        let changes = validate_update(&req, &job(), Utc::now()).unwrap();
        assert_eq!(changes.title.as_deref(), Some("Staff Engineer"));
        assert_eq!(changes.description, None);
        assert_eq!(changes.min_salary, None);
    }

    #[test]
    fn test_update_rejects_empty_title() {
        let req = UpdateJobRequest {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert!(validate_update(&req, &job(), Utc::now()).is_err());
    }

    #[test]
    fn test_window_toggle_aliases() {
        let req: WindowToggleRequest =
            serde_json::from_value(serde_json::json!({ "is_featured": true })).unwrap();
        assert_eq!(req.value, Some(true));
        let req: WindowToggleRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(req.value, None);
    }
}
