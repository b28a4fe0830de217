use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Aggregation window keyword, always anchored to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// From the first day of the current month
    Month,
    /// From the first day of the current calendar quarter
    Quarter,
    /// From January 1 of the current year
    Year,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid period '{0}', use month|quarter|year")]
pub struct ParsePeriodError(pub String);

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// Inclusive date range covered by this period when evaluated on `today`.
    pub fn date_range(self, today: NaiveDate) -> DateRange {
        let start_month = match self {
            Period::Month => today.month(),
            Period::Quarter => (today.month() - 1) / 3 * 3 + 1,
            Period::Year => 1,
        };
        // Day 1 exists in every month.
        let start = NaiveDate::from_ymd_opt(today.year(), start_month, 1).unwrap_or(today);
        DateRange::new(start, today)
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::Month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            other => Err(ParsePeriodError(other.to_string())),
        }
    }
}

/// Inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_range_starts_on_first_day() {
        let range = Period::Month.date_range(date(2026, 10, 16));
        assert_eq!(range.start, date(2026, 10, 1));
        assert_eq!(range.end, date(2026, 10, 16));
    }

    #[test]
    fn test_quarter_range_for_each_quarter() {
        assert_eq!(Period::Quarter.date_range(date(2026, 2, 28)).start, date(2026, 1, 1));
        assert_eq!(Period::Quarter.date_range(date(2026, 6, 30)).start, date(2026, 4, 1));
        assert_eq!(Period::Quarter.date_range(date(2026, 7, 1)).start, date(2026, 7, 1));
        assert_eq!(Period::Quarter.date_range(date(2026, 12, 31)).start, date(2026, 10, 1));
    }

    #[test]
    fn test_year_range_starts_on_january_first() {
        let range = Period::Year.date_range(date(2026, 10, 16));
        assert_eq!(range.start, date(2026, 1, 1));
        assert_eq!(range.end, date(2026, 10, 16));
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = Period::Month.date_range(date(2026, 3, 15));
        assert!(range.contains(date(2026, 3, 1)));
        assert!(range.contains(date(2026, 3, 15)));
        assert!(!range.contains(date(2026, 3, 16)));
        assert!(!range.contains(date(2026, 2, 28)));
    }

    #[test]
    fn test_parse_period() {
        assert_eq!("month".parse::<Period>(), Ok(Period::Month));
        assert_eq!("quarter".parse::<Period>(), Ok(Period::Quarter));
        assert_eq!("year".parse::<Period>(), Ok(Period::Year));
        let err = "week".parse::<Period>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid period 'week', use month|quarter|year");
    }

    #[test]
    fn test_period_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Period::Quarter).unwrap(), "\"quarter\"");
    }
}
