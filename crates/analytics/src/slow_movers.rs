//! Items with little outbound activity over a trailing window.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockscope_core::ItemId;
use stockscope_warehouse::StockMovement;

pub const DEFAULT_DAYS: u32 = 30;
pub const DEFAULT_THRESHOLD: u32 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowMover {
    pub item_id: ItemId,
    pub movement_count: u64,
}

/// Items whose outbound movement count since `since` is at most `threshold`.
///
/// Only items with at least one outbound movement in `movements` are considered,
/// so an item whose last dispatch predates the window is reported with a count
/// of zero. Catalog items that never moved are not visible here. Results are
/// ordered by count ascending; ties keep first-seen order.
pub fn slow_movers(
    movements: &[StockMovement],
    since: DateTime<Utc>,
    threshold: u32,
) -> Vec<SlowMover> {
    let mut order: Vec<SlowMover> = Vec::new();
    let mut slots: HashMap<ItemId, usize> = HashMap::new();
    for m in movements.iter().filter(|m| m.is_outbound()) {
        let slot = *slots.entry(m.item_id).or_insert_with(|| {
            order.push(SlowMover {
                item_id: m.item_id,
                movement_count: 0,
            });
            order.len() - 1
        });
        if m.timestamp >= since {
            order[slot].movement_count += 1;
        }
    }

    let mut slow: Vec<SlowMover> = order
        .into_iter()
        .filter(|s| s.movement_count <= u64::from(threshold))
        .collect();
    slow.sort_by_key(|s| s.movement_count);
    slow
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use stockscope_core::{MovementId, WarehouseId};
    use stockscope_warehouse::MovementType;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap()
    }

    fn out(item: ItemId, days_ago: i64) -> StockMovement {
        StockMovement::new(
            MovementId::new(),
            item,
            WarehouseId::new(),
            MovementType::Outbound,
            1,
            now() - Duration::days(days_ago),
        )
        .unwrap()
    }

    #[test]
    fn counts_only_recent_outbound_and_orders_ascending() {
        let (busy, once, dormant) = (ItemId::new(), ItemId::new(), ItemId::new());
        let movements = vec![
            out(busy, 1),
            out(once, 2),
            out(busy, 3),
            out(dormant, 90),
            out(busy, 4),
        ];
        let since = now() - Duration::days(30);

        let result = slow_movers(&movements, since, 1);
        assert_eq!(
            result,
            vec![
                SlowMover {
                    item_id: dormant,
                    movement_count: 0
                },
                SlowMover {
                    item_id: once,
                    movement_count: 1
                },
            ]
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        let item = ItemId::new();
        let movements = vec![out(item, 1), out(item, 2)];
        let since = now() - Duration::days(30);
        assert!(slow_movers(&movements, since, 1).is_empty());
        assert_eq!(slow_movers(&movements, since, 2).len(), 1);
    }

    #[test]
    fn inbound_only_items_are_not_reported() {
        let item = ItemId::new();
        let inbound = StockMovement::new(
            MovementId::new(),
            item,
            WarehouseId::new(),
            MovementType::Inbound,
            5,
            now(),
        )
        .unwrap();
        assert!(slow_movers(&[inbound], now() - Duration::days(30), 5).is_empty());
    }
}
