use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use crate::activity;
use crate::analytics::stats::conversion_rate;
use crate::analytics::trends::{self, Grain, MONTHLY_BUCKETS};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::activity::ActivityLog;
use crate::models::user::UserType;

const RECENT_ACTIVITY: i64 = 10;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct UserCounts {
    pub total: i64,
    pub jobseekers: i64,
    pub employers: i64,
    pub admins: i64,
}

impl UserCounts {
    pub fn from_rows(rows: &[(UserType, i64)]) -> Self {
        rows.iter().fold(UserCounts::default(), |mut acc, (kind, n)| {
            acc.total += n;
            match kind {
                UserType::Jobseeker => acc.jobseekers += n,
                UserType::Employer => acc.employers += n,
                UserType::Admin => acc.admins += n,
            }
            acc
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyCounts {
    pub total: i64,
    pub pending: i64,
}

#[derive(Debug, Serialize)]
pub struct JobCounts {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Serialize)]
pub struct ApplicationCounts {
    pub total: i64,
    pub pending: i64,
    pub conversion_rate: f64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MonthlyGrowth {
    pub period: String,
    pub label: String,
    pub users: i64,
    pub jobs: i64,
    pub applications: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub users: UserCounts,
    pub companies: CompanyCounts,
    pub jobs: JobCounts,
    pub applications: ApplicationCounts,
    pub monthly_growth: Vec<MonthlyGrowth>,
    pub recent_activity: Vec<ActivityLog>,
}

pub async fn admin_dashboard(pool: &PgPool, user: &AuthUser) -> Result<AdminDashboard, AppError> {
    user.require_admin()?;

    let user_rows: Vec<(UserType, i64)> =
        sqlx::query_as("SELECT user_type, COUNT(*) FROM user_profiles GROUP BY user_type")
            .fetch_all(pool)
            .await?;

    let (companies_total, companies_pending): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'pending') FROM companies",
    )
    .fetch_one(pool)
    .await?;

    let (jobs_total, jobs_active): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'active') FROM jobs")
            .fetch_one(pool)
            .await?;

    let (apps_total, apps_pending, apps_converted): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), \
         COUNT(*) FILTER (WHERE status = 'pending'), \
         COUNT(*) FILTER (WHERE status IN ('approved', 'hired')) \
         FROM job_applications",
    )
    .fetch_one(pool)
    .await?;

    let buckets = Grain::Month.buckets(Utc::now().date_naive(), MONTHLY_BUCKETS);
    let users = trends::series(
        pool,
        Grain::Month,
        &buckets,
        "u.created_at",
        "FROM users u WHERE u.created_at >= $1",
        None,
    )
    .await?;
    let jobs = trends::series(
        pool,
        Grain::Month,
        &buckets,
        "j.created_at",
        "FROM jobs j WHERE j.created_at >= $1",
        None,
    )
    .await?;
    let applications = trends::series(
        pool,
        Grain::Month,
        &buckets,
        "a.created_at",
        "FROM job_applications a WHERE a.created_at >= $1",
        None,
    )
    .await?;

    let monthly_growth = buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| MonthlyGrowth {
            period: Grain::Month.key(*bucket),
            label: Grain::Month.label(*bucket),
            users: users.get(i).copied().unwrap_or(0),
            jobs: jobs.get(i).copied().unwrap_or(0),
            applications: applications.get(i).copied().unwrap_or(0),
        })
        .collect();

    Ok(AdminDashboard {
        users: UserCounts::from_rows(&user_rows),
        companies: CompanyCounts {
            total: companies_total,
            pending: companies_pending,
        },
        jobs: JobCounts {
            total: jobs_total,
            active: jobs_active,
        },
        applications: ApplicationCounts {
            total: apps_total,
            pending: apps_pending,
            conversion_rate: conversion_rate(apps_converted, apps_total),
        },
        monthly_growth,
        recent_activity: activity::recent(pool, RECENT_ACTIVITY).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_counts_from_grouped_rows() {
        let counts = UserCounts::from_rows(&[(UserType::Jobseeker, 40), (UserType::Employer, 9)]);
        assert_eq!(
            counts,
            UserCounts {
                total: 49,
                jobseekers: 40,
                employers: 9,
                admins: 0,
            }
        );
    }

    #[test]
    fn test_user_counts_empty() {
        assert_eq!(UserCounts::from_rows(&[]), UserCounts::default());
    }
}
