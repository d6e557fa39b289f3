//! Event counts per calendar bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockscope_warehouse::Shipment;

use crate::window::Period;

/// Number of events that fell into one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub count: u64,
}

impl TrendPoint {
    pub fn new(period: impl Into<String>, count: u64) -> Self {
        Self {
            period: period.into(),
            count,
        }
    }
}

/// Count timestamps per bucket label, ascending by label.
///
/// Only buckets containing at least one event are returned; gaps are not filled.
pub fn bucket_counts<I>(timestamps: I, period: Period) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
    for ts in timestamps {
        *buckets.entry(period.bucket_label(ts)).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(period, count)| TrendPoint { period, count })
        .collect()
}

/// Delivered shipments per bucket of their delivery time.
pub fn delivery_trends(shipments: &[Shipment], period: Period) -> Vec<TrendPoint> {
    bucket_counts(
        shipments
            .iter()
            .filter(|s| s.is_delivered())
            .filter_map(|s| s.delivered_at),
        period,
    )
}
