//! Fixed-width time buckets for trend series.
//!
//! Monthly trends are always the trailing 6 calendar months and daily trends
//! the trailing 7 days, whatever period the caller selected. Buckets with no
//! rows are reported as zero.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;

pub const MONTHLY_BUCKETS: u32 = 6;
pub const DAILY_BUCKETS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grain {
    Month,
    Day,
}

impl Grain {
    /// Unit name for `date_trunc`.
    pub fn sql_unit(self) -> &'static str {
        match self {
            Grain::Month => "month",
            Grain::Day => "day",
        }
    }

    /// `count` bucket starts ending with the one containing `today`, oldest first.
    pub fn buckets(self, today: NaiveDate, count: u32) -> Vec<NaiveDate> {
        let anchor = match self {
            Grain::Month => today.with_day(1).unwrap_or(today),
            Grain::Day => today,
        };
        (0..count)
            .rev()
            .filter_map(|back| match self {
                Grain::Month => anchor.checked_sub_months(Months::new(back)),
                Grain::Day => anchor.checked_sub_days(Days::new(u64::from(back))),
            })
            .collect()
    }

    pub fn key(self, bucket: NaiveDate) -> String {
        match self {
            Grain::Month => bucket.format("%Y-%m").to_string(),
            Grain::Day => bucket.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn label(self, bucket: NaiveDate) -> String {
        match self {
            Grain::Month => bucket.format("%b %Y").to_string(),
            Grain::Day => bucket.format("%a").to_string(),
        }
    }

    /// `date_trunc('<unit>', <column> AT TIME ZONE 'UTC')::date`
    pub fn truncate(self, column: &str) -> String {
        format!("date_trunc('{}', {column} AT TIME ZONE 'UTC')::date", self.sql_unit())
    }
}

/// Midnight UTC at the start of the first bucket; the lower bound for the
/// bucket query.
pub fn series_start(buckets: &[NaiveDate]) -> Option<DateTime<Utc>> {
    let first = buckets.first()?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&first))
}

/// Counts rows per bucket. `from_where` is the `FROM ... WHERE` tail; it must
/// compare `column` against `$1` (the series start) and may use `$2` for
/// `scope`.
pub async fn series(
    pool: &PgPool,
    grain: Grain,
    buckets: &[NaiveDate],
    column: &str,
    from_where: &str,
    scope: Option<Uuid>,
) -> Result<Vec<i64>, AppError> {
    let Some(start) = series_start(buckets) else {
        return Ok(Vec::new());
    };
    let sql = format!(
        "SELECT {bucket} AS bucket, COUNT(*) {from_where} GROUP BY 1",
        bucket = grain.truncate(column)
    );
    let mut query = sqlx::query_as::<_, (NaiveDate, i64)>(&sql).bind(start);
    if let Some(scope) = scope {
        query = query.bind(scope);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(fill(buckets, &rows))
}

/// Aligns grouped `(bucket, count)` rows onto `buckets`, zero-filling gaps.
pub fn fill(buckets: &[NaiveDate], rows: &[(NaiveDate, i64)]) -> Vec<i64> {
    buckets
        .iter()
        .map(|b| rows.iter().filter(|(d, _)| d == b).map(|(_, c)| *c).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_buckets_cross_year() {
        let buckets = Grain::Month.buckets(date(2026, 2, 17), MONTHLY_BUCKETS);
        assert_eq!(
            buckets,
            vec![
                date(2025, 9, 1),
                date(2025, 10, 1),
                date(2025, 11, 1),
                date(2025, 12, 1),
                date(2026, 1, 1),
                date(2026, 2, 1),
            ]
        );
    }

    #[test]
    fn test_monthly_buckets_from_month_end() {
        let buckets = Grain::Month.buckets(date(2026, 3, 31), 3);
        assert_eq!(buckets, vec![date(2026, 1, 1), date(2026, 2, 1), date(2026, 3, 1)]);
    }

    #[test]
    fn test_daily_buckets() {
        let buckets = Grain::Day.buckets(date(2026, 3, 2), DAILY_BUCKETS);
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0], date(2026, 2, 24));
        assert_eq!(buckets[6], date(2026, 3, 2));
    }

    #[test]
    fn test_fill_zeroes_missing_buckets() {
        let buckets = Grain::Month.buckets(date(2026, 3, 5), 3);
        let rows = [(date(2026, 3, 1), 4), (date(2026, 1, 1), 1)];
        assert_eq!(fill(&buckets, &rows), vec![1, 0, 4]);
    }

    #[test]
    fn test_keys_and_labels() {
        assert_eq!(Grain::Month.key(date(2026, 1, 1)), "2026-01");
        assert_eq!(Grain::Month.label(date(2026, 1, 1)), "Jan 2026");
        assert_eq!(Grain::Day.key(date(2026, 1, 5)), "2026-01-05");
    }

    #[test]
    fn test_series_start_is_midnight() {
        let buckets = [date(2025, 10, 1), date(2025, 11, 1)];
        assert_eq!(
            series_start(&buckets).unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()
        );
        assert!(series_start(&[]).is_none());
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(
            Grain::Day.truncate("a.created_at"),
            "date_trunc('day', a.created_at AT TIME ZONE 'UTC')::date"
        );
    }
}
