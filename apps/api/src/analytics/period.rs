use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Aggregation window selected by `?period=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl Period {
    /// Unknown or missing tokens fall back to 30 days.
    pub fn parse(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("7d") => Period::Week,
            Some("90d") => Period::Quarter,
            Some("1y") => Period::Year,
            _ => Period::Month,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
            Period::Year => 365,
        }
    }

    pub fn start_date(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

impl PeriodQuery {
    pub fn period(&self) -> Period {
        Period::parse(self.period.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_known_tokens() {
        assert_eq!(Period::parse(Some("7d")), Period::Week);
        assert_eq!(Period::parse(Some("30d")), Period::Month);
        assert_eq!(Period::parse(Some("90d")), Period::Quarter);
        assert_eq!(Period::parse(Some("1y")), Period::Year);
    }

    #[test]
    fn test_unknown_defaults_to_thirty_days() {
        assert_eq!(Period::parse(None), Period::Month);
        assert_eq!(Period::parse(Some("2w")), Period::Month);
        assert_eq!(Period::parse(Some("")), Period::Month);
    }

    #[test]
    fn test_start_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            Period::Week.start_date(now),
            Utc.with_ymd_and_hms(2026, 3, 24, 12, 0, 0).unwrap()
        );
        assert_eq!(
            Period::Year.start_date(now),
            Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_serializes_as_token() {
        assert_eq!(serde_json::to_value(Period::Quarter).unwrap(), "90d");
    }
}
