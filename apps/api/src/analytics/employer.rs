//! Employer analytics: figures for the caller's company over the selected
//! period, computed on read.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::analytics::insights::{InsightProvider, Insights};
use crate::analytics::period::Period;
use crate::analytics::stats::{average_days, conversion_rate, status_breakdown, StatusCount};
use crate::analytics::trends::{self, Grain, DAILY_BUCKETS, MONTHLY_BUCKETS};
use crate::auth::AuthUser;
use crate::catalog::companies::company_for_user;
use crate::errors::AppError;
use crate::models::application::ApplicationStatus;

const TOP_JOBS: i64 = 5;

const APPLICATIONS_FROM: &str = "FROM job_applications a JOIN jobs j ON j.id = a.job_id \
     WHERE a.created_at >= $1 AND j.company_id = $2";

const VIEWS_FROM: &str = "FROM job_views v JOIN jobs j ON j.id = v.job_id \
     WHERE v.viewed_at >= $1 AND j.company_id = $2";

#[derive(Debug, Serialize)]
pub struct Overview {
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub total_applications: i64,
    pub total_views: i64,
    pub conversion_rate: f64,
    /// Days, one decimal.
    pub avg_time_to_hire: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TopJob {
    pub id: Uuid,
    pub title: String,
    pub applications: i64,
    pub views_count: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TrendPoint {
    pub period: String,
    pub label: String,
    pub applications: i64,
    pub views: i64,
}

#[derive(Debug, Serialize)]
pub struct EmployerAnalytics {
    pub period: Period,
    pub start_date: DateTime<Utc>,
    pub overview: Overview,
    pub applications_by_status: Vec<StatusCount>,
    pub top_jobs: Vec<TopJob>,
    pub monthly_trends: Vec<TrendPoint>,
    pub weekly_activity: Vec<TrendPoint>,
    pub insights: Insights,
}

pub fn trend_points(
    grain: Grain,
    buckets: &[NaiveDate],
    applications: &[i64],
    views: &[i64],
) -> Vec<TrendPoint> {
    buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| TrendPoint {
            period: grain.key(*bucket),
            label: grain.label(*bucket),
            applications: applications.get(i).copied().unwrap_or(0),
            views: views.get(i).copied().unwrap_or(0),
        })
        .collect()
}

async fn trend(
    pool: &PgPool,
    grain: Grain,
    count: u32,
    company_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<TrendPoint>, AppError> {
    let buckets = grain.buckets(today, count);
    let applications = trends::series(
        pool,
        grain,
        &buckets,
        "a.created_at",
        APPLICATIONS_FROM,
        Some(company_id),
    )
    .await?;
    let views =
        trends::series(pool, grain, &buckets, "v.viewed_at", VIEWS_FROM, Some(company_id)).await?;
    Ok(trend_points(grain, &buckets, &applications, &views))
}

pub async fn employer_analytics(
    pool: &PgPool,
    insights: &dyn InsightProvider,
    user: &AuthUser,
    period: Period,
) -> Result<EmployerAnalytics, AppError> {
    user.require_employer()?;
    let company = company_for_user(pool, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company profile not found".to_string()))?;

    let now = Utc::now();
    let start = period.start_date(now);

    let (total_jobs, active_jobs): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'active') FROM jobs WHERE company_id = $1",
    )
    .bind(company.id)
    .fetch_one(pool)
    .await?;

    let (total_applications, converted, avg_hire_days): (i64, i64, Option<f64>) = sqlx::query_as(
        &format!(
            "SELECT COUNT(*), \
             COUNT(*) FILTER (WHERE a.status IN ('approved', 'hired')), \
             (AVG(EXTRACT(EPOCH FROM (a.hired_at - a.created_at)) / 86400.0) \
                FILTER (WHERE a.status = 'hired' AND a.hired_at IS NOT NULL))::float8 \
             {APPLICATIONS_FROM}"
        ),
    )
    .bind(start)
    .bind(company.id)
    .fetch_one(pool)
    .await?;

    let total_views: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {VIEWS_FROM}"))
        .bind(start)
        .bind(company.id)
        .fetch_one(pool)
        .await?;

    let by_status: Vec<(ApplicationStatus, i64)> =
        sqlx::query_as(&format!("SELECT a.status, COUNT(*) {APPLICATIONS_FROM} GROUP BY a.status"))
            .bind(start)
            .bind(company.id)
            .fetch_all(pool)
            .await?;

    let top_jobs: Vec<TopJob> = sqlx::query_as(
        r#"
        SELECT j.id, j.title, COUNT(a.id) AS applications, j.views_count
        FROM jobs j
        LEFT JOIN job_applications a ON a.job_id = j.id AND a.created_at >= $1
        WHERE j.company_id = $2
        GROUP BY j.id
        ORDER BY applications DESC, j.created_at DESC
        LIMIT $3
        "#,
    )
    .bind(start)
    .bind(company.id)
    .bind(TOP_JOBS)
    .fetch_all(pool)
    .await?;

    let today = now.date_naive();
    let monthly_trends = trend(pool, Grain::Month, MONTHLY_BUCKETS, company.id, today).await?;
    let weekly_activity = trend(pool, Grain::Day, DAILY_BUCKETS, company.id, today).await?;

    Ok(EmployerAnalytics {
        period,
        start_date: start,
        overview: Overview {
            total_jobs,
            active_jobs,
            total_applications,
            total_views,
            conversion_rate: conversion_rate(converted, total_applications),
            avg_time_to_hire: average_days(avg_hire_days),
        },
        applications_by_status: status_breakdown(&by_status),
        top_jobs,
        monthly_trends,
        weekly_activity,
        insights: insights.employer_insights(company.id).await?,
    })
}
