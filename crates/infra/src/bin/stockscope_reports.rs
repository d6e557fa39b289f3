//! Runs the daily warehouse report job once and exits.
//!
//! Usage: `stockscope-reports [YYYY-MM-DD]` (defaults to today, UTC).

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use stockscope_analytics::AnalyticsEngine;
use stockscope_infra::{InfraConfig, PgDataSource, PgReportSink, TracingAlertSink, WarehouseReportJob};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockscope_observability::init();

    let report_date = match std::env::args().nth(1) {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("invalid report date {raw:?}"))?,
        None => Utc::now().date_naive(),
    };

    let config = InfraConfig::from_env().context("failed to load configuration")?;
    let source = PgDataSource::connect(&config)
        .await
        .context("failed to connect to Postgres")?;
    let sink = PgReportSink::new(source.pool().clone());

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; cancelling in-flight queries");
                shutdown.cancel();
            }
        });
    }

    let engine = AnalyticsEngine::new(Arc::new(source))
        .with_config(config.engine_config())
        .scoped(shutdown);
    let job = WarehouseReportJob::new(engine, Arc::new(sink), Arc::new(TracingAlertSink))
        .with_low_stock_threshold(config.low_stock_threshold);

    let summary = job.run_once(report_date).await?;
    tracing::info!(%report_date, ?summary, "report run finished");

    if summary.failed > 0 && summary.generated == 0 && summary.already_recorded == 0 {
        bail!("every warehouse report failed ({} warehouses)", summary.failed);
    }
    Ok(())
}
