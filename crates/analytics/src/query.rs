//! Caller-facing query parameters.
//!
//! Field names follow the camelCase query-string convention so controllers can
//! deserialize requests straight into these types. Every field is optional and
//! malformed values fall back to defaults instead of failing.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use stockscope_core::WarehouseId;

use crate::anomaly::DEFAULT_SIGMA;
use crate::forecast::{DEFAULT_WINDOW, ForecastMethod};
use crate::slow_movers::{DEFAULT_DAYS, DEFAULT_THRESHOLD};
use crate::source::ReportFilter;
use crate::window::{Period, TimeWindow, parse_date};

/// `start`/`end` bounds (epoch and now when absent).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeQuery {
    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }

    pub fn all_time() -> Self {
        Self::default()
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::resolve(self.start.as_deref(), self.end.as_deref(), now)
    }
}

/// Range plus bucket granularity (day when absent or unrecognised).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub period: Option<String>,
}

impl TrendQuery {
    pub fn range(&self) -> RangeQuery {
        RangeQuery {
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    pub fn period(&self) -> Period {
        Period::parse_or(self.period.as_deref(), Period::Day)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub period: Option<String>,
    pub method: Option<String>,
    pub window: Option<usize>,
}

impl ForecastQuery {
    pub fn trend(&self) -> TrendQuery {
        TrendQuery {
            start: self.start.clone(),
            end: self.end.clone(),
            period: self.period.clone(),
        }
    }

    pub fn method(&self) -> ForecastMethod {
        self.method
            .as_deref()
            .and_then(ForecastMethod::parse)
            .unwrap_or_default()
    }

    /// Number of trailing buckets to average; zero falls back to the default.
    pub fn window(&self) -> usize {
        match self.window {
            Some(w) if w >= 1 => w,
            _ => DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub sigma: Option<f64>,
}

impl AnomalyQuery {
    pub fn range(&self) -> RangeQuery {
        RangeQuery {
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    /// Sigma multiplier; non-finite or non-positive values fall back to the default.
    pub fn sigma(&self) -> f64 {
        match self.sigma {
            Some(s) if s.is_finite() && s > 0.0 => s,
            _ => DEFAULT_SIGMA,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverQuery {
    pub warehouse_id: Option<WarehouseId>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub period: Option<String>,
}

/// Optional warehouse scope shared by aging, ABC and receiving speed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseScope {
    pub warehouse_id: Option<WarehouseId>,
}

impl WarehouseScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn warehouse(warehouse_id: WarehouseId) -> Self {
        Self {
            warehouse_id: Some(warehouse_id),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowMoverQuery {
    pub warehouse_id: Option<WarehouseId>,
    pub days: Option<u32>,
    pub threshold: Option<u32>,
}

impl SlowMoverQuery {
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_DAYS)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }

    /// Start of the trailing window. A span reaching past the earliest
    /// representable instant covers all history.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_days(i64::from(self.days()))
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceUsageQuery {
    pub warehouse_id: Option<WarehouseId>,
    pub zone: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHistoryQuery {
    pub warehouse_id: Option<WarehouseId>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ReportHistoryQuery {
    /// Unparseable bounds leave that side of the range open.
    pub fn filter(&self) -> ReportFilter {
        ReportFilter {
            warehouse_id: self.warehouse_id,
            from: self.start.as_deref().and_then(parse_date),
            to: self.end.as_deref().and_then(parse_date),
        }
    }
}
