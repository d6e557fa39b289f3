//! Destinations for report snapshots and low-stock alerts.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use stockscope_core::{ReportId, WarehouseId};
use stockscope_warehouse::WarehouseReport;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("failed to write report: {0}")]
    Write(String),
}

/// Result of offering a snapshot to a [`ReportSink`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    /// A snapshot for the same warehouse and date is already stored; nothing was written.
    AlreadyRecorded,
}

/// Persists report snapshots.
///
/// At most one snapshot exists per `(warehouse_id, report_date)`. Implementations
/// only ever insert; a second save for the same pair leaves the first in place.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync + 'static {
    async fn save(&self, report: &WarehouseReport) -> Result<SaveOutcome, SinkError>;
}

/// Raised when a warehouse's stored quantity drops below the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    pub warehouse_id: WarehouseId,
    pub report_id: ReportId,
    pub total_quantity: i64,
    pub threshold: i64,
}

impl LowStockAlert {
    pub const KIND: &'static str = "warehouse.low_stock";

    pub fn message(&self) -> String {
        format!(
            "Warehouse {} total stock {} is below threshold {}",
            self.warehouse_id, self.total_quantity, self.threshold
        )
    }
}

/// Receives low-stock alerts.
///
/// Alerts are notifications, not records: delivery is best-effort and never
/// fails the report run.
pub trait LowStockAlertSink: Send + Sync + 'static {
    fn raise(&self, alert: LowStockAlert);
}

/// In-memory report sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryReportSink {
    inner: Mutex<Vec<WarehouseReport>>,
}

impl InMemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<WarehouseReport> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl ReportSink for InMemoryReportSink {
    async fn save(&self, report: &WarehouseReport) -> Result<SaveOutcome, SinkError> {
        let mut reports = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if reports.iter().any(|r| {
            r.warehouse_id == report.warehouse_id && r.report_date == report.report_date
        }) {
            return Ok(SaveOutcome::AlreadyRecorded);
        }
        reports.push(report.clone());
        Ok(SaveOutcome::Inserted)
    }
}

/// In-memory alert sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAlertSink {
    inner: Mutex<Vec<LowStockAlert>>,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<LowStockAlert> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LowStockAlertSink for InMemoryAlertSink {
    fn raise(&self, alert: LowStockAlert) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alert);
    }
}

/// Emits each alert as a `warn` event.
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingAlertSink;

impl LowStockAlertSink for TracingAlertSink {
    fn raise(&self, alert: LowStockAlert) {
        warn!(
            kind = LowStockAlert::KIND,
            warehouse = %alert.warehouse_id,
            report = %alert.report_id,
            total_quantity = alert.total_quantity,
            threshold = alert.threshold,
            "{}",
            alert.message()
        );
    }
}
