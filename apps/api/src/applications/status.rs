//! Permission-scoped status changes.
//!
//! One canonical `ApplicationStatus` column, three callers with different
//! allowed targets. The admin and employer vocabularies overlap only on
//! `pending` and `rejected`; admins use `approved`/`hired`/`interview_scheduled`
//! while employers use the finer-grained pipeline statuses. Both sets are kept
//! as they are used today rather than merged.

use crate::errors::{AppError, FieldErrors};
use crate::models::application::ApplicationStatus;

use ApplicationStatus::*;

const ADMIN_TARGETS: &[ApplicationStatus] = &[Pending, Approved, Rejected, Hired, InterviewScheduled];

const EMPLOYER_TARGETS: &[ApplicationStatus] = &[
    Pending,
    Reviewed,
    Shortlisted,
    Interviewed,
    Offered,
    Rejected,
    Withdrawn,
];

const APPLICANT_TARGETS: &[ApplicationStatus] = &[Withdrawn];

/// Who is asking for the status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScope {
    Admin,
    Employer,
    Applicant,
}

impl StatusScope {
    pub fn allowed_targets(self) -> &'static [ApplicationStatus] {
        match self {
            StatusScope::Admin => ADMIN_TARGETS,
            StatusScope::Employer => EMPLOYER_TARGETS,
            StatusScope::Applicant => APPLICANT_TARGETS,
        }
    }

    pub fn permits(self, target: ApplicationStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Parses a requested status against this scope's vocabulary.
    pub fn parse_target(self, raw: &str) -> Result<ApplicationStatus, AppError> {
        raw.trim()
            .parse::<ApplicationStatus>()
            .ok()
            .filter(|s| self.permits(*s))
            .ok_or_else(|| {
                let allowed: Vec<&str> = self.allowed_targets().iter().map(|s| s.as_str()).collect();
                AppError::Validation(FieldErrors::single(
                    "status",
                    format!("The selected status is invalid. Allowed: {}", allowed.join(", ")),
                ))
            })
    }

    /// Staff may move an application from any status to any of their targets.
    /// Applicants may only withdraw an application that is still open.
    pub fn check_transition(
        self,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<(), AppError> {
        if !self.permits(to) {
            return Err(AppError::Validation(FieldErrors::single(
                "status",
                format!("Status '{to}' cannot be set here"),
            )));
        }
        if self == StatusScope::Applicant && matches!(from, Hired | Rejected | Withdrawn) {
            return Err(AppError::UnprocessableEntity(format!(
                "An application that is {from} cannot be withdrawn"
            )));
        }
        Ok(())
    }
}
