use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockscope_core::{DomainError, DomainResult, ReportId, WarehouseId};

/// Dated space-usage snapshot for one warehouse.
///
/// Written once per warehouse per day by the report job and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseReport {
    pub id: ReportId,
    pub warehouse_id: WarehouseId,
    pub report_date: NaiveDate,
    pub total_skus: u64,
    pub total_quantity: i64,
}

impl WarehouseReport {
    pub fn snapshot(
        warehouse_id: WarehouseId,
        report_date: NaiveDate,
        total_skus: u64,
        total_quantity: i64,
    ) -> DomainResult<Self> {
        if total_quantity < 0 {
            return Err(DomainError::validation(
                "report total quantity cannot be negative",
            ));
        }
        Ok(Self {
            id: ReportId::new(),
            warehouse_id,
            report_date,
            total_skus,
            total_quantity,
        })
    }
}
