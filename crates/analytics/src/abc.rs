//! ABC (Pareto) classification of items by outbound consumption value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockscope_core::ItemId;
use stockscope_warehouse::{InventoryItem, StockMovement};

/// Cumulative share (percent) up to which an item is class `A`.
pub const CLASS_A_MAX_PERCENT: f64 = 70.0;
/// Cumulative share (percent) up to which an item is class `B`.
pub const CLASS_B_MAX_PERCENT: f64 = 90.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub fn for_cumulative_percent(percent: f64) -> Self {
        if percent <= CLASS_A_MAX_PERCENT {
            AbcClass::A
        } else if percent <= CLASS_B_MAX_PERCENT {
            AbcClass::B
        } else {
            AbcClass::C
        }
    }
}

/// One ranked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcRow {
    pub item_id: ItemId,
    pub value: f64,
    pub cumulative_percent: f64,
    pub bucket: AbcClass,
}

/// Rank items by consumption value (`Σ quantity × unit_cost` over outbound movements).
///
/// Items are ordered by value, highest first; equal values keep the order in which
/// the items first appear in `movements`. Movements of items with no catalog entry
/// carry no value and the item is left out. A zero total yields 0% for every item.
pub fn classify_abc(movements: &[StockMovement], catalog: &[InventoryItem]) -> Vec<AbcRow> {
    let unit_costs: HashMap<ItemId, f64> =
        catalog.iter().map(|i| (i.item_id, i.unit_cost)).collect();

    let mut order: Vec<(ItemId, f64)> = Vec::new();
    let mut slots: HashMap<ItemId, usize> = HashMap::new();
    for m in movements.iter().filter(|m| m.is_outbound()) {
        let Some(cost) = unit_costs.get(&m.item_id) else {
            continue;
        };
        let slot = *slots.entry(m.item_id).or_insert_with(|| {
            order.push((m.item_id, 0.0));
            order.len() - 1
        });
        order[slot].1 += m.quantity as f64 * cost;
    }

    // Stable: ties keep first-seen order.
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total: f64 = order.iter().map(|(_, v)| v).sum();
    let mut running = 0.0;
    order
        .into_iter()
        .map(|(item_id, value)| {
            running += value;
            let cumulative_percent = if total > 0.0 {
                running * 100.0 / total
            } else {
                0.0
            };
            AbcRow {
                item_id,
                value,
                cumulative_percent,
                bucket: AbcClass::for_cumulative_percent(cumulative_percent),
            }
        })
        .collect()
}
