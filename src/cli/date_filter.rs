//! Date thresholds for the `--created` and `--modified` flags.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDateFilterError {
    #[error("invalid relative date: {0}")]
    Relative(String),

    #[error("days must be non-negative: {0}")]
    NegativeDays(String),

    #[error("invalid date format (expected YYYY-MM-DD or Nd): {0}")]
    Format(String),
}

/// Matches timestamps on or after a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    threshold: DateTime<Utc>,
}

impl DateFilter {
    /// Parses `Nd` (N days before `now`) or `YYYY-MM-DD` (midnight UTC).
    pub fn parse_at(s: &str, now: DateTime<Utc>) -> Result<Self, ParseDateFilterError> {
        let s = s.trim();

        if let Some(days) = s.strip_suffix('d') {
            let days: i64 = days
                .parse()
                .map_err(|_| ParseDateFilterError::Relative(s.to_string()))?;
            if days < 0 {
                return Err(ParseDateFilterError::NegativeDays(s.to_string()));
            }
            let threshold = TimeDelta::try_days(days)
                .and_then(|delta| now.checked_sub_signed(delta))
                .ok_or_else(|| ParseDateFilterError::Relative(s.to_string()))?;
            return Ok(Self { threshold });
        }

        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ParseDateFilterError::Format(s.to_string()))?;
        Ok(Self {
            threshold: Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
        })
    }

    pub fn matches(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.threshold
    }

    pub fn threshold(&self) -> DateTime<Utc> {
        self.threshold
    }
}

impl FromStr for DateFilter {
    type Err = ParseDateFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_at(s, Utc::now())
    }
}
