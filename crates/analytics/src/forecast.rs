//! Next-bucket delivery forecast built on top of the trend series.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::stats::mean;
use crate::trend::TrendPoint;
use crate::window::Period;

/// Default number of trailing buckets averaged by the SMA method.
pub const DEFAULT_WINDOW: usize = 3;

/// Label used for the forecast bucket when it cannot be computed from the period.
pub const UNRESOLVED_NEXT_LABEL: &str = "next";

/// Forecasting model.
///
/// `Exp` and `Linear` are accepted but not implemented: they always produce
/// `forecast: None`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMethod {
    #[default]
    Sma,
    Exp,
    Linear,
}

impl ForecastMethod {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "sma" => Some(ForecastMethod::Sma),
            "exp" => Some(ForecastMethod::Exp),
            "linear" => Some(ForecastMethod::Linear),
            _ => None,
        }
    }
}

/// Forecast for the bucket following the last observed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: String,
    pub count: u64,
}

/// Observed trend plus the forecast, if one could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    pub trends: Vec<TrendPoint>,
    pub forecast: Option<ForecastPoint>,
}

/// Forecast the next bucket from an ascending trend series.
///
/// SMA averages the last `window` counts and rounds to the nearest integer.
/// With fewer than `window` buckets there is no forecast. A `window` of zero is
/// treated as one.
pub fn forecast_next(
    trends: Vec<TrendPoint>,
    period: Period,
    method: ForecastMethod,
    window: usize,
) -> Forecast {
    let forecast = match method {
        ForecastMethod::Sma => simple_moving_average(&trends, period, window.max(1)),
        ForecastMethod::Exp | ForecastMethod::Linear => None,
    };
    Forecast { trends, forecast }
}

fn simple_moving_average(
    trends: &[TrendPoint],
    period: Period,
    window: usize,
) -> Option<ForecastPoint> {
    if trends.len() < window {
        return None;
    }
    let tail: Vec<f64> = trends[trends.len() - window..]
        .iter()
        .map(|p| p.count as f64)
        .collect();
    let count = mean(&tail).round() as u64;

    let last = trends.last()?;
    Some(ForecastPoint {
        period: next_label(&last.period, period),
        count,
    })
}

/// Label of the bucket after `label`.
///
/// Only daily buckets are resolved; coarser periods yield [`UNRESOLVED_NEXT_LABEL`].
fn next_label(label: &str, period: Period) -> String {
    match period {
        Period::Day => NaiveDate::parse_from_str(label, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.checked_add_signed(Duration::days(1)))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| UNRESOLVED_NEXT_LABEL.to_string()),
        Period::Week | Period::Month | Period::Year => UNRESOLVED_NEXT_LABEL.to_string(),
    }
}
