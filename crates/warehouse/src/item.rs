use serde::{Deserialize, Serialize};

use stockscope_core::{DomainError, DomainResult, ItemId, LocationId, WarehouseId};

/// Catalog entry carrying the valuation used for consumption value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub item_id: ItemId,
    pub unit_cost: f64,
}

impl InventoryItem {
    pub fn new(item_id: ItemId, unit_cost: f64) -> DomainResult<Self> {
        if !(unit_cost.is_finite() && unit_cost >= 0.0) {
            return Err(DomainError::validation(
                "unit cost must be a finite non-negative number",
            ));
        }
        Ok(Self { item_id, unit_cost })
    }
}

/// Stock of one item held in one warehouse, optionally slotted at a rack location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseItem {
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub location_id: Option<LocationId>,
    /// Rack capacity for this slot, when one has been configured.
    pub max_threshold: Option<i64>,
}

impl WarehouseItem {
    pub fn new(item_id: ItemId, warehouse_id: WarehouseId, quantity: i64) -> Self {
        Self {
            item_id,
            warehouse_id,
            quantity,
            location_id: None,
            max_threshold: None,
        }
    }

    pub fn at_location(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn with_max_threshold(mut self, max_threshold: i64) -> Self {
        self.max_threshold = Some(max_threshold);
        self
    }
}
