//! Warehouse record model.
//!
//! Read-only views of the operational records the analytics engine consumes.
//! The records are owned by an external store; this crate only validates
//! their invariants on construction (no IO, no HTTP, no storage).

pub mod item;
pub mod location;
pub mod movement;
pub mod report;
pub mod shipment;

pub use item::{InventoryItem, WarehouseItem};
pub use location::Location;
pub use movement::{MovementType, StockMovement};
pub use report::WarehouseReport;
pub use shipment::{Shipment, ShipmentStatus};
