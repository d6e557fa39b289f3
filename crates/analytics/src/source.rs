//! Read-only data source the engine queries.
//!
//! The engine stays storage-agnostic: infra crates implement this trait over
//! Postgres, in-memory fixtures, or anything else. Every filter is a typed
//! value so implementations can bind it as a statement parameter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockscope_core::{ItemId, LocationId, WarehouseId};
use stockscope_warehouse::{
    InventoryItem, Location, MovementType, Shipment, ShipmentStatus, StockMovement, WarehouseItem,
    WarehouseReport,
};

use crate::window::TimeWindow;

/// Failure reported by a data source. Never retried by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("failed to decode row: {0}")]
    Decode(String),
}

/// Filter criteria for stock movement queries. `None` means unfiltered.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub movement_type: Option<MovementType>,
    /// Inclusive lower bound on the movement timestamp.
    pub occurred_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the movement timestamp.
    pub occurred_before: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn in_warehouse(mut self, warehouse_id: Option<WarehouseId>) -> Self {
        self.warehouse_id = warehouse_id;
        self
    }

    pub fn of_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = Some(movement_type);
        self
    }

    pub fn within(mut self, window: &TimeWindow) -> Self {
        self.occurred_after = Some(window.start);
        self.occurred_before = Some(window.end);
        self
    }

    pub fn matches(&self, m: &StockMovement) -> bool {
        self.warehouse_id.is_none_or(|w| m.warehouse_id == w)
            && self.movement_type.is_none_or(|t| m.movement_type == t)
            && self.occurred_after.is_none_or(|t| m.timestamp >= t)
            && self.occurred_before.is_none_or(|t| m.timestamp <= t)
    }
}

/// Filter criteria for persisted report snapshots (inclusive dates).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn matches(&self, r: &WarehouseReport) -> bool {
        self.warehouse_id.is_none_or(|w| r.warehouse_id == w)
            && self.from.is_none_or(|d| r.report_date >= d)
            && self.to.is_none_or(|d| r.report_date <= d)
    }
}

/// Async, read-only query interface over warehouse records.
///
/// Implementations must be safe to call concurrently. Dropping a returned
/// future must abandon the query.
#[async_trait::async_trait]
pub trait WarehouseDataSource: Send + Sync {
    /// DELIVERED shipments whose `delivered_at` lies in `window`.
    async fn delivered_shipments(&self, window: &TimeWindow) -> Result<Vec<Shipment>, SourceError>;

    /// Number of DELIVERED shipments whose `delivered_at` lies in `window`.
    async fn count_delivered(&self, window: &TimeWindow) -> Result<u64, SourceError> {
        Ok(self.delivered_shipments(window).await?.len() as u64)
    }

    /// Number of shipments currently in any of `statuses`.
    async fn count_shipments_by_status(
        &self,
        statuses: &[ShipmentStatus],
    ) -> Result<u64, SourceError>;

    /// Movements matching `filter`, ordered by timestamp then id.
    async fn stock_movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, SourceError>;

    /// Catalog entries for the given items (missing items are simply absent).
    async fn inventory_items(&self, item_ids: &[ItemId])
    -> Result<Vec<InventoryItem>, SourceError>;

    /// Stock rows, optionally for one warehouse.
    async fn warehouse_items(
        &self,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<WarehouseItem>, SourceError>;

    /// Locations for the given ids (unknown ids are simply absent).
    async fn locations(&self, location_ids: &[LocationId]) -> Result<Vec<Location>, SourceError>;

    /// Every warehouse known to the store.
    async fn warehouse_ids(&self) -> Result<Vec<WarehouseId>, SourceError>;

    /// Persisted report snapshots matching `filter`.
    async fn warehouse_reports(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<WarehouseReport>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use stockscope_core::MovementId;

    #[test]
    fn movement_filter_bounds_are_inclusive() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap();
        let wh = WarehouseId::new();
        let m = StockMovement::new(MovementId::new(), ItemId::new(), wh, MovementType::Inbound, 1, ts)
            .unwrap();

        let exact = MovementFilter::default().within(&TimeWindow::new(ts, ts));
        assert!(exact.matches(&m));

        let later = MovementFilter::default()
            .within(&TimeWindow::new(ts + Duration::seconds(1), ts + Duration::days(1)));
        assert!(!later.matches(&m));

        assert!(!MovementFilter::default().of_type(MovementType::Outbound).matches(&m));
        assert!(!MovementFilter::default().in_warehouse(Some(WarehouseId::new())).matches(&m));
        assert!(MovementFilter::default().in_warehouse(Some(wh)).matches(&m));
    }
}
