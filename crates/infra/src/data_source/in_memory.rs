use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use stockscope_analytics::{
    MovementFilter, ReportFilter, SourceError, TimeWindow, WarehouseDataSource,
};
use stockscope_core::{ItemId, LocationId, WarehouseId};
use stockscope_warehouse::{
    InventoryItem, Location, Shipment, ShipmentStatus, StockMovement, WarehouseItem,
    WarehouseReport,
};

/// Injected misbehaviour for exercising the engine's failure paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Every query fails with this error.
    Fail(SourceError),
    /// Every query waits this long before answering.
    Stall(Duration),
}

/// In-memory warehouse records.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    shipments: RwLock<Vec<Shipment>>,
    movements: RwLock<Vec<StockMovement>>,
    catalog: RwLock<Vec<InventoryItem>>,
    stock: RwLock<Vec<WarehouseItem>>,
    locations: RwLock<Vec<Location>>,
    warehouses: RwLock<Vec<WarehouseId>>,
    reports: RwLock<Vec<WarehouseReport>>,
    fault: RwLock<Option<Fault>>,
    failing_warehouses: RwLock<HashSet<WarehouseId>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_shipment(&self, shipment: Shipment) {
        write(&self.shipments).push(shipment);
    }

    pub fn insert_movement(&self, movement: StockMovement) {
        self.add_warehouse(movement.warehouse_id);
        write(&self.movements).push(movement);
    }

    pub fn insert_inventory_item(&self, item: InventoryItem) {
        write(&self.catalog).push(item);
    }

    pub fn insert_warehouse_item(&self, item: WarehouseItem) {
        self.add_warehouse(item.warehouse_id);
        write(&self.stock).push(item);
    }

    pub fn insert_location(&self, location: Location) {
        write(&self.locations).push(location);
    }

    pub fn insert_report(&self, report: WarehouseReport) {
        self.add_warehouse(report.warehouse_id);
        write(&self.reports).push(report);
    }

    /// Register a warehouse, even one holding no stock yet.
    pub fn add_warehouse(&self, warehouse_id: WarehouseId) {
        let mut warehouses = write(&self.warehouses);
        if !warehouses.contains(&warehouse_id) {
            warehouses.push(warehouse_id);
        }
    }

    pub fn set_fault(&self, fault: Option<Fault>) {
        *write(&self.fault) = fault;
    }

    /// Make stock queries scoped to `warehouse_id` fail.
    pub fn fail_warehouse(&self, warehouse_id: WarehouseId) {
        write(&self.failing_warehouses).insert(warehouse_id);
    }

    async fn check_fault(&self) -> Result<(), SourceError> {
        let fault = read(&self.fault).clone();
        match fault {
            Some(Fault::Fail(err)) => Err(err),
            Some(Fault::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl WarehouseDataSource for InMemoryDataSource {
    async fn delivered_shipments(&self, window: &TimeWindow) -> Result<Vec<Shipment>, SourceError> {
        self.check_fault().await?;
        let mut out: Vec<Shipment> = read(&self.shipments)
            .iter()
            .filter(|s| s.status == ShipmentStatus::Delivered)
            .filter(|s| s.delivered_at.is_some_and(|t| window.contains(t)))
            .cloned()
            .collect();
        out.sort_by_key(|s| (s.delivered_at, s.id));
        Ok(out)
    }

    async fn count_shipments_by_status(
        &self,
        statuses: &[ShipmentStatus],
    ) -> Result<u64, SourceError> {
        self.check_fault().await?;
        let count = read(&self.shipments)
            .iter()
            .filter(|s| statuses.contains(&s.status))
            .count();
        Ok(count as u64)
    }

    async fn stock_movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, SourceError> {
        self.check_fault().await?;
        let mut out: Vec<StockMovement> = read(&self.movements)
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        out.sort_by_key(|m| (m.timestamp, m.id));
        Ok(out)
    }

    async fn inventory_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<Vec<InventoryItem>, SourceError> {
        self.check_fault().await?;
        Ok(read(&self.catalog)
            .iter()
            .filter(|i| item_ids.contains(&i.item_id))
            .cloned()
            .collect())
    }

    async fn warehouse_items(
        &self,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<WarehouseItem>, SourceError> {
        self.check_fault().await?;
        if let Some(w) = warehouse_id {
            if read(&self.failing_warehouses).contains(&w) {
                return Err(SourceError::Query(format!(
                    "stock rows for warehouse {w} unavailable"
                )));
            }
        }
        Ok(read(&self.stock)
            .iter()
            .filter(|i| warehouse_id.is_none_or(|w| i.warehouse_id == w))
            .cloned()
            .collect())
    }

    async fn locations(&self, location_ids: &[LocationId]) -> Result<Vec<Location>, SourceError> {
        self.check_fault().await?;
        Ok(read(&self.locations)
            .iter()
            .filter(|l| location_ids.contains(&l.id))
            .cloned()
            .collect())
    }

    async fn warehouse_ids(&self) -> Result<Vec<WarehouseId>, SourceError> {
        self.check_fault().await?;
        Ok(read(&self.warehouses).clone())
    }

    async fn warehouse_reports(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<WarehouseReport>, SourceError> {
        self.check_fault().await?;
        Ok(read(&self.reports)
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}
