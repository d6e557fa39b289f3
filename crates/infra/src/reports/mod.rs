//! Daily warehouse report job.
//!
//! For every warehouse the job computes space usage, persists a dated
//! snapshot and raises a low-stock alert when the total quantity falls below
//! the configured threshold. Snapshots are insert-only, one per warehouse per
//! day; rerunning a date writes nothing new and raises no alerts.

pub mod job;
pub mod postgres;
pub mod sink;

pub use job::{DEFAULT_LOW_STOCK_THRESHOLD, ReportJobError, ReportRunSummary, WarehouseReportJob};
pub use postgres::PgReportSink;
pub use sink::{
    InMemoryAlertSink, InMemoryReportSink, LowStockAlert, LowStockAlertSink, ReportSink,
    SaveOutcome, SinkError, TracingAlertSink,
};
