//! Infrastructure layer: data source adapters, report job, config.

pub mod config;
pub mod data_source;
pub mod reports;

pub use config::{ConfigError, InfraConfig};
pub use data_source::{Fault, InMemoryDataSource, PgDataSource};
pub use reports::{
    InMemoryAlertSink, InMemoryReportSink, LowStockAlert, LowStockAlertSink, PgReportSink,
    ReportJobError, ReportRunSummary, ReportSink, SaveOutcome, TracingAlertSink,
    WarehouseReportJob,
};

#[cfg(test)]
mod integration_tests;
