//! Postgres report sink.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::instrument;

use stockscope_warehouse::WarehouseReport;

use super::sink::{ReportSink, SaveOutcome, SinkError};
use crate::data_source::postgres::map_sqlx_error;

/// Inserts snapshots into `"WarehouseReport"`, skipping a warehouse/date pair
/// that is already recorded.
#[derive(Debug, Clone)]
pub struct PgReportSink {
    pool: Arc<PgPool>,
}

impl PgReportSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl ReportSink for PgReportSink {
    #[instrument(
        skip(self, report),
        fields(
            report_id = %report.id,
            warehouse_id = %report.warehouse_id,
            report_date = %report.report_date
        ),
        err
    )]
    async fn save(&self, report: &WarehouseReport) -> Result<SaveOutcome, SinkError> {
        let total_skus = i64::try_from(report.total_skus).map_err(|_| {
            SinkError::Write(format!("total_skus out of range: {}", report.total_skus))
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO "WarehouseReport"
                ("id", "warehouseId", "reportDate", "totalSkus", "totalQuantity")
            SELECT $1, $2, $3, $4, $5
            WHERE NOT EXISTS (
                SELECT 1 FROM "WarehouseReport"
                WHERE "warehouseId" = $2 AND "reportDate" = $3
            )
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(report.id.as_uuid())
        .bind(report.warehouse_id.as_uuid())
        .bind(report.report_date)
        .bind(total_skus)
        .bind(report.total_quantity)
        .execute(&*self.pool)
        .await
        .map_err(|e| SinkError::Write(map_sqlx_error("save_report", e).to_string()))?;

        Ok(match result.rows_affected() {
            0 => SaveOutcome::AlreadyRecorded,
            _ => SaveOutcome::Inserted,
        })
    }
}
