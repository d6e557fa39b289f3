//! Stock turnover, inventory aging and receiving speed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockscope_warehouse::StockMovement;

use crate::trend::{TrendPoint, bucket_counts};
use crate::window::{Period, TimeWindow};

/// Period assumed when the caller does not name one.
pub const DEFAULT_TURNOVER_PERIOD: Period = Period::Week;

/// Window and bucket granularity for a turnover query.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TurnoverScope {
    pub window: TimeWindow,
    pub period: Period,
}

impl TurnoverScope {
    /// Resolve the turnover window.
    ///
    /// - explicit `start`/`end`: resolved like any other range, bucketed by the
    ///   named period (day when unrecognised)
    /// - no bounds, known period: trailing span for that period
    /// - no bounds, missing period: trailing week
    /// - no bounds, unrecognised period: all time, bucketed by day
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        period: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let parsed = period.and_then(Period::parse);
        if start.is_some() || end.is_some() {
            return Self {
                window: TimeWindow::resolve(start, end, now),
                period: period.map_or(DEFAULT_TURNOVER_PERIOD, |_| parsed.unwrap_or_default()),
            };
        }
        match (period, parsed) {
            (None, _) => Self {
                window: TimeWindow::trailing(DEFAULT_TURNOVER_PERIOD, now),
                period: DEFAULT_TURNOVER_PERIOD,
            },
            (Some(_), Some(p)) => Self {
                window: TimeWindow::trailing(p, now),
                period: p,
            },
            (Some(_), None) => Self {
                window: TimeWindow::all_time(now),
                period: Period::Day,
            },
        }
    }
}

/// Movement counts per bucket.
pub fn stock_turnover(movements: &[StockMovement], scope: &TurnoverScope) -> Vec<TrendPoint> {
    bucket_counts(
        movements
            .iter()
            .map(|m| m.timestamp)
            .filter(|ts| scope.window.contains(*ts)),
        scope.period,
    )
}

/// Fixed time-since-received classes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "0-30")]
    UpTo30,
    #[serde(rename = "31-60")]
    UpTo60,
    #[serde(rename = "61+")]
    Over60,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 3] = [AgingBucket::UpTo30, AgingBucket::UpTo60, AgingBucket::Over60];

    /// Upper bounds are inclusive: 30 days is still `0-30`.
    pub fn for_age_days(days: i64) -> Self {
        if days <= 30 {
            AgingBucket::UpTo30
        } else if days <= 60 {
            AgingBucket::UpTo60
        } else {
            AgingBucket::Over60
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::UpTo30 => "0-30",
            AgingBucket::UpTo60 => "31-60",
            AgingBucket::Over60 => "61+",
        }
    }
}

/// Received quantity that falls into one aging bucket.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingRow {
    pub bucket: AgingBucket,
    pub total: i64,
}

/// Sum inbound quantity per aging bucket.
///
/// Age is whole days between the movement and `now`. Every bucket is present
/// in the output, in age order, so the totals always partition the inbound quantity.
pub fn inventory_aging(movements: &[StockMovement], now: DateTime<Utc>) -> Vec<AgingRow> {
    let mut totals = [0i64; 3];
    for m in movements.iter().filter(|m| m.is_inbound()) {
        let age_days = (now - m.timestamp).num_days();
        let idx = match AgingBucket::for_age_days(age_days) {
            AgingBucket::UpTo30 => 0,
            AgingBucket::UpTo60 => 1,
            AgingBucket::Over60 => 2,
        };
        totals[idx] += m.quantity;
    }
    AgingBucket::ALL
        .iter()
        .zip(totals)
        .map(|(bucket, total)| AgingRow {
            bucket: *bucket,
            total,
        })
        .collect()
}

/// Average gap between consecutive inbound receipts.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivingSpeed {
    pub average_hours: f64,
}

/// Mean hours between consecutive inbound movements, rounded to two decimals.
///
/// Fewer than two receipts gives `0`.
pub fn receiving_speed(movements: &[StockMovement]) -> ReceivingSpeed {
    let mut stamps: Vec<DateTime<Utc>> = movements
        .iter()
        .filter(|m| m.is_inbound())
        .map(|m| m.timestamp)
        .collect();
    if stamps.len() < 2 {
        return ReceivingSpeed::default();
    }
    stamps.sort();

    let total_ms: i64 = stamps
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds())
        .sum();
    let avg_hours = total_ms as f64 / (stamps.len() - 1) as f64 / 3_600_000.0;
    ReceivingSpeed {
        average_hours: (avg_hours * 100.0).round() / 100.0,
    }
}
