use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use stockscope_analytics::{AnalyticsEngine, AnalyticsError, SpaceUsageQuery, WarehouseDataSource};
use stockscope_core::{DomainError, WarehouseId};
use stockscope_warehouse::WarehouseReport;

use super::sink::{LowStockAlert, LowStockAlertSink, ReportSink, SaveOutcome, SinkError};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 100;

#[derive(Debug, Error)]
pub enum ReportJobError {
    #[error("failed to list warehouses: {0}")]
    Warehouses(#[source] AnalyticsError),

    #[error("space usage for warehouse {warehouse_id} failed: {source}")]
    SpaceUsage {
        warehouse_id: WarehouseId,
        #[source]
        source: AnalyticsError,
    },

    #[error("invalid snapshot for warehouse {warehouse_id}: {source}")]
    Snapshot {
        warehouse_id: WarehouseId,
        #[source]
        source: DomainError,
    },

    #[error("failed to persist report for warehouse {warehouse_id}: {source}")]
    Persist {
        warehouse_id: WarehouseId,
        #[source]
        source: SinkError,
    },
}

/// Outcome of one run.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRunSummary {
    /// Snapshots persisted.
    pub generated: usize,
    /// Warehouses already snapshotted for the date by an earlier run.
    pub already_recorded: usize,
    pub alerts: usize,
    /// Warehouses skipped because a step failed.
    pub failed: usize,
}

/// Daily space-usage snapshot per warehouse, with low-stock alerting.
///
/// Scheduling is the caller's concern; [`WarehouseReportJob::run_once`] is the
/// body of one run.
pub struct WarehouseReportJob<S: ?Sized, R, A> {
    engine: AnalyticsEngine<S>,
    reports: Arc<R>,
    alerts: Arc<A>,
    low_stock_threshold: i64,
}

impl<S, R, A> WarehouseReportJob<S, R, A>
where
    S: WarehouseDataSource + ?Sized,
    R: ReportSink,
    A: LowStockAlertSink,
{
    pub fn new(engine: AnalyticsEngine<S>, reports: Arc<R>, alerts: Arc<A>) -> Self {
        Self {
            engine,
            reports,
            alerts,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    /// Snapshot every known warehouse for `report_date`.
    ///
    /// A warehouse whose computation or write fails is logged, counted in
    /// `failed` and skipped. Only failing to list the warehouses aborts the run.
    #[instrument(skip(self), fields(threshold = self.low_stock_threshold), err)]
    pub async fn run_once(&self, report_date: NaiveDate) -> Result<ReportRunSummary, ReportJobError> {
        let warehouses = self
            .engine
            .warehouse_ids()
            .await
            .map_err(ReportJobError::Warehouses)?;

        let mut summary = ReportRunSummary::default();
        for warehouse_id in warehouses {
            match self.report_warehouse(warehouse_id, report_date).await {
                Ok(WarehouseOutcome::Recorded { alerted }) => {
                    summary.generated += 1;
                    if alerted {
                        summary.alerts += 1;
                    }
                }
                Ok(WarehouseOutcome::AlreadyRecorded) => summary.already_recorded += 1,
                Err(e) => {
                    warn!(warehouse = %warehouse_id, error = %e, "warehouse report failed; skipping");
                    summary.failed += 1;
                }
            }
        }

        info!(
            generated = summary.generated,
            already_recorded = summary.already_recorded,
            alerts = summary.alerts,
            failed = summary.failed,
            "warehouse daily reports generated"
        );
        Ok(summary)
    }

    async fn report_warehouse(
        &self,
        warehouse_id: WarehouseId,
        report_date: NaiveDate,
    ) -> Result<WarehouseOutcome, ReportJobError> {
        let query = SpaceUsageQuery {
            warehouse_id: Some(warehouse_id),
            zone: None,
        };
        let usage = self
            .engine
            .space_usage(&query)
            .await
            .map_err(|source| ReportJobError::SpaceUsage {
                warehouse_id,
                source,
            })?;

        let report = WarehouseReport::snapshot(
            warehouse_id,
            report_date,
            usage.total_skus,
            usage.total_quantity,
        )
        .map_err(|source| ReportJobError::Snapshot {
            warehouse_id,
            source,
        })?;

        let saved = self
            .reports
            .save(&report)
            .await
            .map_err(|source| ReportJobError::Persist {
                warehouse_id,
                source,
            })?;
        if saved == SaveOutcome::AlreadyRecorded {
            debug!(warehouse = %warehouse_id, %report_date, "snapshot already recorded; skipping");
            return Ok(WarehouseOutcome::AlreadyRecorded);
        }
        debug!(warehouse = %warehouse_id, report = %report.id, "report persisted");

        if report.total_quantity < self.low_stock_threshold {
            self.alerts.raise(LowStockAlert {
                warehouse_id,
                report_id: report.id,
                total_quantity: report.total_quantity,
                threshold: self.low_stock_threshold,
            });
            return Ok(WarehouseOutcome::Recorded { alerted: true });
        }
        Ok(WarehouseOutcome::Recorded { alerted: false })
    }
}

enum WarehouseOutcome {
    Recorded { alerted: bool },
    AlreadyRecorded,
}
