//! Pure figures derived from counts.

use serde::Serialize;

use crate::models::application::ApplicationStatus;

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Converted applications as a percentage of all, one decimal. 0 when there
/// are no applications.
pub fn conversion_rate(converted: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round1((converted as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
}

/// Average days to hire, one decimal. A NULL average (nobody hired) is 0.
pub fn average_days(avg: Option<f64>) -> f64 {
    match avg {
        Some(days) if days.is_finite() && days > 0.0 => round1(days),
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub count: i64,
}

/// Expands grouped `(status, count)` rows to every status, zero-filled, in
/// pipeline order.
pub fn status_breakdown(rows: &[(ApplicationStatus, i64)]) -> Vec<StatusCount> {
    ApplicationStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: rows
                .iter()
                .filter(|(s, _)| *s == status)
                .map(|(_, c)| *c)
                .sum(),
        })
        .collect()
}
