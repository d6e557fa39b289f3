use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockscope_core::{DomainError, DomainResult, ItemId, MovementId, WarehouseId};

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Inbound,
    Outbound,
    Transfer,
    Adjustment,
    Return,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Inbound => "INBOUND",
            MovementType::Outbound => "OUTBOUND",
            MovementType::Transfer => "TRANSFER",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::Return => "RETURN",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INBOUND" => Ok(MovementType::Inbound),
            "OUTBOUND" => Ok(MovementType::Outbound),
            "TRANSFER" => Ok(MovementType::Transfer),
            "ADJUSTMENT" => Ok(MovementType::Adjustment),
            "RETURN" => Ok(MovementType::Return),
            other => Err(DomainError::unknown_variant("movement type", other)),
        }
    }
}

/// An immutable, recorded stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    pub timestamp: DateTime<Utc>,
}

impl StockMovement {
    pub fn new(
        id: MovementId,
        item_id: ItemId,
        warehouse_id: WarehouseId,
        movement_type: MovementType,
        quantity: i64,
        timestamp: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("movement quantity cannot be negative"));
        }
        Ok(Self {
            id,
            item_id,
            warehouse_id,
            movement_type,
            quantity,
            timestamp,
        })
    }

    pub fn is_inbound(&self) -> bool {
        self.movement_type == MovementType::Inbound
    }

    pub fn is_outbound(&self) -> bool {
        self.movement_type == MovementType::Outbound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_quantity_is_rejected() {
        let err = StockMovement::new(
            MovementId::new(),
            ItemId::new(),
            WarehouseId::new(),
            MovementType::Inbound,
            -1,
            Utc::now(),
        );
        assert!(matches!(err, Err(DomainError::Validation(_))));
    }

    #[test]
    fn zero_quantity_is_allowed() {
        let m = StockMovement::new(
            MovementId::new(),
            ItemId::new(),
            WarehouseId::new(),
            MovementType::Outbound,
            0,
            Utc::now(),
        )
        .unwrap();
        assert!(m.is_outbound());
        assert!(!m.is_inbound());
    }

    #[test]
    fn tokens_parse_and_display() {
        assert_eq!("OUTBOUND".parse::<MovementType>().unwrap(), MovementType::Outbound);
        assert_eq!(MovementType::Inbound.to_string(), "INBOUND");
        assert!("SIDEWAYS".parse::<MovementType>().is_err());
    }
}
