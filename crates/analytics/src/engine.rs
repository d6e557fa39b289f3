//! Async façade tying the data source to the computations.
//!
//! Each operation is a stateless read: fetch matching records, run the pure
//! computation, return a plain result. Fetches race the engine's cancellation
//! token and a per-query timeout; a failed fetch is returned as-is with no
//! partial result and no retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use stockscope_core::{LocationId, WarehouseId};
use stockscope_warehouse::{MovementType, ShipmentStatus, WarehouseReport};

use crate::abc::{AbcRow, classify_abc};
use crate::anomaly::{DeliveryAnomaly, detect_delivery_anomalies};
use crate::clock::{Clock, SystemClock};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::forecast::{Forecast, forecast_next};
use crate::query::{
    AnomalyQuery, ForecastQuery, RangeQuery, ReportHistoryQuery, SlowMoverQuery, SpaceUsageQuery,
    TrendQuery, TurnoverQuery, WarehouseScope,
};
use crate::slow_movers::{SlowMover, slow_movers};
use crate::source::{MovementFilter, SourceError, WarehouseDataSource};
use crate::space::{RackUtilization, SpaceUsage, rack_utilization, space_usage};
use crate::timeliness::{CountTotal, OnTimeLate, classify_on_time_late};
use crate::trend::{TrendPoint, delivery_trends};
use crate::turnover::{
    AgingRow, ReceivingSpeed, TurnoverScope, inventory_aging, receiving_speed, stock_turnover,
};

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on a single data-source fetch.
    pub query_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(30),
        }
    }
}

/// Warehouse analytics over an injected data source.
pub struct AnalyticsEngine<S: ?Sized> {
    source: Arc<S>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    cancel: CancellationToken,
}

impl<S: ?Sized> Clone for AnalyticsEngine<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<S> AnalyticsEngine<S>
where
    S: WarehouseDataSource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// A copy of this engine whose fetches abort when `token` is cancelled.
    ///
    /// Intended per request: cancel the token when the caller goes away.
    pub fn scoped(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn fetch<T, F>(&self, operation: &'static str, query: F) -> AnalyticsResult<T>
    where
        F: Future<Output = Result<T, SourceError>> + Send,
    {
        let timeout = self.config.query_timeout;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(operation, "query cancelled");
                Err(AnalyticsError::Cancelled { operation })
            }
            outcome = tokio::time::timeout(timeout, query) => match outcome {
                Ok(Ok(rows)) => Ok(rows),
                Ok(Err(source)) => Err(AnalyticsError::Source { operation, source }),
                Err(_) => Err(AnalyticsError::TimedOut { operation, after: timeout }),
            },
        }
    }

    /// On-time vs late split of deliveries in the window.
    #[instrument(skip(self), err)]
    pub async fn on_time_late(&self, range: &RangeQuery) -> AnalyticsResult<OnTimeLate> {
        let window = range.resolve(self.now());
        let shipments = self
            .fetch("on_time_late", self.source.delivered_shipments(&window))
            .await?;
        Ok(classify_on_time_late(&shipments))
    }

    /// Number of deliveries completed in the window.
    #[instrument(skip(self), err)]
    pub async fn completed_count(&self, range: &RangeQuery) -> AnalyticsResult<CountTotal> {
        let window = range.resolve(self.now());
        let total = self
            .fetch("completed_count", self.source.count_delivered(&window))
            .await?;
        Ok(CountTotal { total })
    }

    /// Shipments currently in transit or out for delivery.
    #[instrument(skip(self), err)]
    pub async fn in_transit_count(&self) -> AnalyticsResult<CountTotal> {
        let total = self
            .fetch(
                "in_transit_count",
                self.source
                    .count_shipments_by_status(&ShipmentStatus::IN_FLIGHT),
            )
            .await?;
        Ok(CountTotal { total })
    }

    /// Deliveries per bucket, ascending.
    #[instrument(skip(self), err)]
    pub async fn delivery_trends(&self, query: &TrendQuery) -> AnalyticsResult<Vec<TrendPoint>> {
        let window = query.range().resolve(self.now());
        let shipments = self
            .fetch("delivery_trends", self.source.delivered_shipments(&window))
            .await?;
        let trends = delivery_trends(&shipments, query.period());
        debug!(buckets = trends.len(), "delivery trends computed");
        Ok(trends)
    }

    /// Trend series plus next-bucket forecast.
    #[instrument(skip(self), err)]
    pub async fn forecast(&self, query: &ForecastQuery) -> AnalyticsResult<Forecast> {
        let trend = query.trend();
        let trends = self.delivery_trends(&trend).await?;
        Ok(forecast_next(
            trends,
            trend.period(),
            query.method(),
            query.window(),
        ))
    }

    /// Deliveries with unusually long transit, longest first.
    #[instrument(skip(self), err)]
    pub async fn delivery_anomalies(
        &self,
        query: &AnomalyQuery,
    ) -> AnalyticsResult<Vec<DeliveryAnomaly>> {
        let window = query.range().resolve(self.now());
        let shipments = self
            .fetch("delivery_anomalies", self.source.delivered_shipments(&window))
            .await?;
        let (baseline, anomalies) = detect_delivery_anomalies(&shipments, query.sigma());
        debug!(
            samples = baseline.samples,
            mean_secs = baseline.mean_secs,
            stddev_secs = baseline.stddev_secs,
            flagged = anomalies.len(),
            "delivery anomaly scan finished"
        );
        Ok(anomalies)
    }

    /// Stock movements per bucket.
    #[instrument(skip(self), err)]
    pub async fn stock_turnover(&self, query: &TurnoverQuery) -> AnalyticsResult<Vec<TrendPoint>> {
        let scope = TurnoverScope::resolve(
            query.start.as_deref(),
            query.end.as_deref(),
            query.period.as_deref(),
            self.now(),
        );
        let filter = MovementFilter::default()
            .in_warehouse(query.warehouse_id)
            .within(&scope.window);
        let movements = self
            .fetch("stock_turnover", self.source.stock_movements(&filter))
            .await?;
        Ok(stock_turnover(&movements, &scope))
    }

    /// Inbound quantity per aging bucket.
    #[instrument(skip(self), err)]
    pub async fn inventory_aging(&self, scope: &WarehouseScope) -> AnalyticsResult<Vec<AgingRow>> {
        let filter = MovementFilter::default()
            .in_warehouse(scope.warehouse_id)
            .of_type(MovementType::Inbound);
        let movements = self
            .fetch("inventory_aging", self.source.stock_movements(&filter))
            .await?;
        Ok(inventory_aging(&movements, self.now()))
    }

    /// Pareto classification by outbound consumption value, highest first.
    #[instrument(skip(self), err)]
    pub async fn abc_analysis(&self, scope: &WarehouseScope) -> AnalyticsResult<Vec<AbcRow>> {
        let filter = MovementFilter::default()
            .in_warehouse(scope.warehouse_id)
            .of_type(MovementType::Outbound);
        let movements = self
            .fetch("abc_analysis", self.source.stock_movements(&filter))
            .await?;

        let item_ids = distinct(movements.iter().map(|m| m.item_id));
        let catalog = self
            .fetch("abc_analysis", self.source.inventory_items(&item_ids))
            .await?;

        let rows = classify_abc(&movements, &catalog);
        debug!(items = rows.len(), "abc classification computed");
        Ok(rows)
    }

    /// Items with few outbound movements in the trailing window, ascending.
    #[instrument(skip(self), err)]
    pub async fn slow_movers(&self, query: &SlowMoverQuery) -> AnalyticsResult<Vec<SlowMover>> {
        let since = query.since(self.now());
        let filter = MovementFilter::default()
            .in_warehouse(query.warehouse_id)
            .of_type(MovementType::Outbound);
        let movements = self
            .fetch("slow_movers", self.source.stock_movements(&filter))
            .await?;
        Ok(slow_movers(&movements, since, query.threshold()))
    }

    /// Occupancy per slotted item of one warehouse.
    #[instrument(skip(self), err)]
    pub async fn rack_utilization(
        &self,
        warehouse_id: WarehouseId,
    ) -> AnalyticsResult<Vec<RackUtilization>> {
        let items = self
            .fetch(
                "rack_utilization",
                self.source.warehouse_items(Some(warehouse_id)),
            )
            .await?;
        let location_ids = distinct(items.iter().filter_map(|i| i.location_id));
        let locations = self
            .fetch("rack_utilization", self.source.locations(&location_ids))
            .await?;
        Ok(rack_utilization(&items, &locations))
    }

    /// Distinct SKUs and total quantity, optionally for one warehouse and zone.
    #[instrument(skip(self), err)]
    pub async fn space_usage(&self, query: &SpaceUsageQuery) -> AnalyticsResult<SpaceUsage> {
        let items = self
            .fetch("space_usage", self.source.warehouse_items(query.warehouse_id))
            .await?;
        let locations = match query.zone {
            Some(_) => {
                let location_ids: Vec<LocationId> =
                    distinct(items.iter().filter_map(|i| i.location_id));
                self.fetch("space_usage", self.source.locations(&location_ids))
                    .await?
            }
            None => Vec::new(),
        };
        Ok(space_usage(&items, &locations, query.zone.as_deref()))
    }

    /// Mean hours between consecutive inbound receipts.
    #[instrument(skip(self), err)]
    pub async fn receiving_speed(&self, scope: &WarehouseScope) -> AnalyticsResult<ReceivingSpeed> {
        let filter = MovementFilter::default()
            .in_warehouse(scope.warehouse_id)
            .of_type(MovementType::Inbound);
        let movements = self
            .fetch("receiving_speed", self.source.stock_movements(&filter))
            .await?;
        Ok(receiving_speed(&movements))
    }

    /// Persisted daily snapshots, oldest first.
    #[instrument(skip(self), err)]
    pub async fn warehouse_reports(
        &self,
        query: &ReportHistoryQuery,
    ) -> AnalyticsResult<Vec<WarehouseReport>> {
        let filter = query.filter();
        let mut reports = self
            .fetch("warehouse_reports", self.source.warehouse_reports(&filter))
            .await?;
        reports.sort_by(|a, b| {
            a.report_date
                .cmp(&b.report_date)
                .then_with(|| a.warehouse_id.cmp(&b.warehouse_id))
        });
        Ok(reports)
    }

    /// Every warehouse the data source knows about.
    #[instrument(skip(self), err)]
    pub async fn warehouse_ids(&self) -> AnalyticsResult<Vec<WarehouseId>> {
        self.fetch("warehouse_ids", self.source.warehouse_ids())
            .await
    }
}

/// Unique values in first-seen order.
fn distinct<T, I>(values: I) -> Vec<T>
where
    T: Copy + Eq + std::hash::Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen = std::collections::HashSet::new();
    values.into_iter().filter(|v| seen.insert(*v)).collect()
}
