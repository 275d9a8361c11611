use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "employment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "salary_period", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SalaryPeriod {
    Hourly,
    Daily,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Paused,
    Closed,
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub is_remote: bool,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub salary_currency: String,
    pub salary_period: SalaryPeriod,
    pub status: JobStatus,
    pub is_featured: bool,
    pub featured_until: Option<DateTime<Utc>>,
    pub is_premium: bool,
    pub premium_until: Option<DateTime<Utc>>,
    pub views_count: i64,
    pub applications_count: i64,
    pub positions_available: i32,
    pub application_deadline: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Active, has open positions, and the deadline (if any) is still ahead.
    pub fn is_accepting_applications_at(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Active
            && self.positions_available > 0
            && self.application_deadline.map_or(true, |d| d > now)
    }

    pub fn is_accepting_applications(&self) -> bool {
        self.is_accepting_applications_at(Utc::now())
    }

    pub fn is_featured_at(&self, now: DateTime<Utc>) -> bool {
        window_open(self.is_featured, self.featured_until, now)
    }

    pub fn is_featured_now(&self) -> bool {
        self.is_featured_at(Utc::now())
    }

    pub fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        window_open(self.is_premium, self.premium_until, now)
    }

    pub fn is_premium_now(&self) -> bool {
        self.is_premium_at(Utc::now())
    }
}

/// A flag with an optional expiry: set, and either unbounded or not yet expired.
pub fn window_open(flag: bool, until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    flag && until.map_or(true, |u| u > now)
}

/// Job row joined with the display names a listing needs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
    pub category_name: String,
    pub location_name: Option<String>,
}

/// Outgoing job representation with the computed flags resolved at `now`.
#[derive(Debug, Clone, Serialize)]
pub struct JobResource {
    #[serde(flatten)]
    pub listing: JobListing,
    pub featured: bool,
    pub premium: bool,
    pub accepting_applications: bool,
}

impl JobResource {
    pub fn at(listing: JobListing, now: DateTime<Utc>) -> Self {
        let featured = listing.job.is_featured_at(now);
        let premium = listing.job.is_premium_at(now);
        let accepting_applications = listing.job.is_accepting_applications_at(now);
        Self {
            listing,
            featured,
            premium,
            accepting_applications,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn job() -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            description: "Build APIs".to_string(),
            category_id: Uuid::new_v4(),
            location_id: None,
            employment_type: EmploymentType::FullTime,
            experience_level: ExperienceLevel::Mid,
            is_remote: false,
            min_salary: Some(80_000),
            max_salary: Some(120_000),
            salary_currency: "USD".to_string(),
            salary_period: SalaryPeriod::Yearly,
            status: JobStatus::Active,
            is_featured: false,
            featured_until: None,
            is_premium: false,
            premium_until: None,
            views_count: 0,
            applications_count: 0,
            positions_available: 1,
            application_deadline: None,
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::job;
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_active_job_without_deadline_accepts() {
        assert!(job().is_accepting_applications_at(Utc::now()));
    }

    #[test]
    fn test_past_deadline_rejects() {
        let now = Utc::now();
        let mut j = job();
        j.application_deadline = Some(now - Duration::days(1));
        assert!(!j.is_accepting_applications_at(now));
    }

    #[test]
    fn test_deadline_exactly_now_rejects() {
        let now = Utc::now();
        let mut j = job();
        j.application_deadline = Some(now);
        assert!(!j.is_accepting_applications_at(now));
    }

    #[test]
    fn test_future_deadline_accepts() {
        let now = Utc::now();
        let mut j = job();
        j.application_deadline = Some(now + Duration::hours(2));
        assert!(j.is_accepting_applications_at(now));
    }

    #[test]
    fn test_no_positions_rejects() {
        let mut j = job();
        j.positions_available = 0;
        assert!(!j.is_accepting_applications());
    }

    #[test]
    fn test_non_active_statuses_reject() {
        for status in [JobStatus::Paused, JobStatus::Closed, JobStatus::Draft] {
            let mut j = job();
            j.status = status;
            assert!(!j.is_accepting_applications(), "{status:?} accepted");
        }
    }

    #[test]
    fn test_featured_with_expired_until_is_not_featured() {
        let now = Utc::now();
        let mut j = job();
        j.is_featured = true;
        j.featured_until = Some(now - Duration::minutes(1));
        assert!(!j.is_featured_at(now));
    }

    #[test]
    fn test_featured_without_until_is_featured() {
        let mut j = job();
        j.is_featured = true;
        assert!(j.is_featured_now());
    }

    #[test]
    fn test_until_without_flag_is_not_premium() {
        let now = Utc::now();
        let mut j = job();
        j.premium_until = Some(now + Duration::days(30));
        assert!(!j.is_premium_at(now));
        j.is_premium = true;
        assert!(j.is_premium_at(now));
    }

    #[test]
    fn test_job_resource_resolves_flags() {
        let mut j = job();
        j.is_featured = true;
        let listing = JobListing {
            job: j,
            company_name: "Acme".into(),
            category_name: "Engineering".into(),
            location_name: Some("Berlin".into()),
        };
        let view = JobResource::at(listing, Utc::now());
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["featured"], true);
        assert_eq!(v["premium"], false);
        assert_eq!(v["company_name"], "Acme");
        assert_eq!(v["employment_type"], "full_time");
    }
}
