use serde::{Deserialize, Serialize};

use stockscope_core::LocationId;

/// A rack slot, addressed by zone and grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub zone: String,
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub fn new(id: LocationId, zone: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            id,
            zone: zone.into(),
            x,
            y,
        }
    }
}
