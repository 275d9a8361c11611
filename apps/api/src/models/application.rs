use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Every status an application row can hold. Which statuses a caller may set
/// depends on who is calling; see `applications::status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    InterviewScheduled,
    Interviewed,
    Offered,
    Approved,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 10] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Offered,
        ApplicationStatus::Approved,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Timestamp column stamped when an application enters this status.
    pub fn milestone_column(self) -> Option<&'static str> {
        match self {
            ApplicationStatus::Pending => None,
            ApplicationStatus::Reviewed => Some("reviewed_at"),
            ApplicationStatus::Shortlisted => Some("shortlisted_at"),
            ApplicationStatus::InterviewScheduled => Some("interview_scheduled_at"),
            ApplicationStatus::Interviewed => Some("interviewed_at"),
            ApplicationStatus::Offered => Some("offered_at"),
            ApplicationStatus::Approved => Some("approved_at"),
            ApplicationStatus::Hired => Some("hired_at"),
            ApplicationStatus::Rejected => Some("rejected_at"),
            ApplicationStatus::Withdrawn => Some("withdrawn_at"),
        }
    }

    /// Counted as a successful outcome by the conversion rate.
    pub fn is_conversion(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Hired)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown application status '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume_path: Option<String>,
    pub rating: Option<i16>,
    pub employer_notes: Option<String>,
    pub candidate_notes: Option<String>,
    pub is_favorite: bool,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub shortlisted_at: Option<DateTime<Utc>>,
    pub interview_scheduled_at: Option<DateTime<Utc>>,
    pub interviewed_at: Option<DateTime<Utc>>,
    pub offered_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub hired_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application row joined with job and applicant display fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: JobApplication,
    pub job_title: String,
    pub company_id: Uuid,
    pub company_name: String,
    pub applicant_name: String,
    pub applicant_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_serde() {
        for status in ApplicationStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
    }

    #[test]
    fn test_from_str_round_trips_every_status() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>(), Ok(status));
        }
        assert!("hired!".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_only_pending_has_no_milestone() {
        for status in ApplicationStatus::ALL {
            assert_eq!(
                status.milestone_column().is_none(),
                status == ApplicationStatus::Pending
            );
        }
    }

    #[test]
    fn test_conversion_statuses() {
        assert!(ApplicationStatus::Hired.is_conversion());
        assert!(ApplicationStatus::Approved.is_conversion());
        assert!(!ApplicationStatus::Offered.is_conversion());
    }
}
