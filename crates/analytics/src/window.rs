//! Time windows and period bucketing.
//!
//! Every bucket label format sorts lexicographically in chronological order,
//! so callers can keep buckets in a `BTreeMap<String, _>` and read them back
//! in time order.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calendar granularity used to group events.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// Parse one of `day`, `week`, `month`, `year`.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "day" => Some(Period::Day),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            _ => None,
        }
    }

    /// Parse `token`, substituting `default` when it is missing or unrecognised.
    pub fn parse_or(token: Option<&str>, default: Period) -> Period {
        token.and_then(Period::parse).unwrap_or(default)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Bucket label for `ts`: `YYYY-MM-DD`, `YYYY-Www` (ISO week), `YYYY-MM` or `YYYY`.
    pub fn bucket_label(&self, ts: DateTime<Utc>) -> String {
        match self {
            Period::Day => ts.format("%Y-%m-%d").to_string(),
            Period::Week => {
                let iso = ts.iso_week();
                format!("{:04}-W{:02}", iso.year(), iso.week())
            }
            Period::Month => ts.format("%Y-%m").to_string(),
            Period::Year => format!("{:04}", ts.year()),
        }
    }

    /// Trailing span used when a period stands in for an explicit window.
    pub fn trailing_span(&self) -> Duration {
        match self {
            Period::Day => Duration::hours(24),
            Period::Week => Duration::days(7),
            Period::Month => Duration::days(30),
            Period::Year => Duration::days(365),
        }
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive `[start, end]` time range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Resolve caller-supplied bounds.
    ///
    /// Missing or unparseable `start` falls back to the Unix epoch, `end` to `now`.
    pub fn resolve(start: Option<&str>, end: Option<&str>, now: DateTime<Utc>) -> Self {
        let start = start
            .and_then(parse_instant)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let end = end.and_then(parse_instant).unwrap_or(now);
        Self { start, end }
    }

    /// `[now - period span, now]`, clamped to the earliest representable instant.
    pub fn trailing(period: Period, now: DateTime<Utc>) -> Self {
        Self {
            start: now
                .checked_sub_signed(period.trailing_span())
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now,
        }
    }

    /// `[epoch, now]`.
    pub fn all_time(now: DateTime<Utc>) -> Self {
        Self {
            start: DateTime::<Utc>::UNIX_EPOCH,
            end: now,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC)
/// or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

/// Parse the calendar date of a bound, accepting the same inputs as [`parse_instant`].
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).date_naive())
}
