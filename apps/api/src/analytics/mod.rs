// Read-side aggregation for the admin dashboard and employer analytics.
// Everything is computed per request from jobs, applications and job views.

pub mod dashboard;
pub mod employer;
pub mod handlers;
pub mod insights;
pub mod period;
pub mod stats;
pub mod trends;
