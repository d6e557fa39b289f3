//! Delivery timeliness: on-time vs late, completed and in-flight counts.

use serde::{Deserialize, Serialize};

use stockscope_warehouse::Shipment;

/// On-time vs late split of delivered shipments.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnTimeLate {
    pub on_time: u64,
    pub late: u64,
}

/// A bare total, as returned by the completed and in-transit counters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountTotal {
    pub total: u64,
}

/// Classify delivered shipments.
///
/// A delivery counts as on time when `delivered_at <= shipment_date`. Shipments
/// without a shipment date cannot be compared and are left out of both counts.
pub fn classify_on_time_late(shipments: &[Shipment]) -> OnTimeLate {
    shipments
        .iter()
        .filter_map(Shipment::is_on_time)
        .fold(OnTimeLate::default(), |mut acc, on_time| {
            if on_time {
                acc.on_time += 1;
            } else {
                acc.late += 1;
            }
            acc
        })
}
