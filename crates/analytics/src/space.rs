//! Space usage and rack utilization.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use stockscope_core::{ItemId, LocationId};
use stockscope_warehouse::{Location, WarehouseItem};

/// Occupancy of one rack slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RackUtilization {
    pub rack_id: LocationId,
    pub item_id: ItemId,
    pub zone: String,
    pub x: i32,
    pub y: i32,
    pub quantity: i64,
    pub capacity: i64,
    pub utilization: f64,
}

/// Capacity of a slot: the configured threshold, or the stored quantity itself
/// when none is set (unbounded slots read as fully utilized).
pub fn effective_capacity(item: &WarehouseItem) -> i64 {
    item.max_threshold.unwrap_or(item.quantity)
}

/// `quantity / capacity`, or `0` when capacity is not positive.
pub fn utilization_ratio(quantity: i64, capacity: i64) -> f64 {
    if capacity > 0 {
        quantity as f64 / capacity as f64
    } else {
        0.0
    }
}

/// Utilization per slotted item. Items without a resolvable location are left out.
pub fn rack_utilization(items: &[WarehouseItem], locations: &[Location]) -> Vec<RackUtilization> {
    let by_id: HashMap<LocationId, &Location> = locations.iter().map(|l| (l.id, l)).collect();
    items
        .iter()
        .filter_map(|item| {
            let location = by_id.get(&item.location_id?)?;
            let capacity = effective_capacity(item);
            Some(RackUtilization {
                rack_id: location.id,
                item_id: item.item_id,
                zone: location.zone.clone(),
                x: location.x,
                y: location.y,
                quantity: item.quantity,
                capacity,
                utilization: utilization_ratio(item.quantity, capacity),
            })
        })
        .collect()
}

/// Distinct SKUs and total stored quantity.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceUsage {
    pub total_skus: u64,
    pub total_quantity: i64,
}

/// Summarise warehouse items, optionally restricted to one zone.
///
/// With a zone, only items slotted at a location in that zone count.
pub fn space_usage(
    items: &[WarehouseItem],
    locations: &[Location],
    zone: Option<&str>,
) -> SpaceUsage {
    let in_zone: Option<HashSet<LocationId>> = zone.map(|z| {
        locations
            .iter()
            .filter(|l| l.zone == z)
            .map(|l| l.id)
            .collect()
    });

    let mut skus: HashSet<ItemId> = HashSet::new();
    let mut total_quantity = 0i64;
    for item in items {
        if let Some(allowed) = &in_zone {
            match item.location_id {
                Some(loc) if allowed.contains(&loc) => {}
                _ => continue,
            }
        }
        skus.insert(item.item_id);
        total_quantity += item.quantity;
    }

    SpaceUsage {
        total_skus: skus.len() as u64,
        total_quantity,
    }
}
