use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockscope_core::{DomainError, DomainResult, ShipmentId};

/// Lifecycle status of a shipment as recorded by the carrier integration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

impl ShipmentStatus {
    /// Statuses counted as "currently moving" by the in-transit snapshot.
    pub const IN_FLIGHT: [ShipmentStatus; 2] =
        [ShipmentStatus::InTransit, ShipmentStatus::OutForDelivery];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Cancelled => "CANCELLED",
            ShipmentStatus::Returned => "RETURNED",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        Self::IN_FLIGHT.contains(self)
    }
}

impl core::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ShipmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ShipmentStatus::Pending),
            "IN_TRANSIT" => Ok(ShipmentStatus::InTransit),
            "OUT_FOR_DELIVERY" => Ok(ShipmentStatus::OutForDelivery),
            "DELIVERED" => Ok(ShipmentStatus::Delivered),
            "CANCELLED" => Ok(ShipmentStatus::Cancelled),
            "RETURNED" => Ok(ShipmentStatus::Returned),
            other => Err(DomainError::unknown_variant("shipment status", other)),
        }
    }
}

/// Read-only view of a shipment.
///
/// `delivered_at` is only meaningful when `status == Delivered`; the
/// constructors keep it `None` for every other status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: ShipmentId,
    pub status: ShipmentStatus,
    pub shipment_date: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Shipment {
    /// A shipment that has not been delivered yet.
    pub fn open(
        id: ShipmentId,
        status: ShipmentStatus,
        shipment_date: Option<DateTime<Utc>>,
    ) -> DomainResult<Self> {
        if status == ShipmentStatus::Delivered {
            return Err(DomainError::invariant(
                "delivered shipments must carry a delivery time",
            ));
        }
        Ok(Self {
            id,
            status,
            shipment_date,
            delivered_at: None,
        })
    }

    pub fn delivered(
        id: ShipmentId,
        shipment_date: Option<DateTime<Utc>>,
        delivered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status: ShipmentStatus::Delivered,
            shipment_date,
            delivered_at: Some(delivered_at),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == ShipmentStatus::Delivered && self.delivered_at.is_some()
    }

    /// `Some(true)` when delivered no later than the promised shipment date.
    ///
    /// `None` when the shipment is not delivered or has no shipment date to compare against.
    pub fn is_on_time(&self) -> Option<bool> {
        if !self.is_delivered() {
            return None;
        }
        let delivered_at = self.delivered_at?;
        let shipment_date = self.shipment_date?;
        Some(delivered_at <= shipment_date)
    }

    /// Seconds between shipment date and delivery (negative when delivered early).
    pub fn transit_secs(&self) -> Option<f64> {
        if !self.is_delivered() {
            return None;
        }
        let delta = self.delivered_at? - self.shipment_date?;
        Some(delta.num_milliseconds() as f64 / 1000.0)
    }
}
