//! `stockscope-analytics`: warehouse KPIs over a read-only data source.
//!
//! The computation modules are pure functions over record slices. The
//! [`AnalyticsEngine`] fetches records through a [`WarehouseDataSource`] and
//! feeds them to those functions; it holds no state between calls.

pub mod abc;
pub mod anomaly;
pub mod clock;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod query;
pub mod slow_movers;
pub mod source;
pub mod space;
pub mod stats;
pub mod timeliness;
pub mod trend;
pub mod turnover;
pub mod window;

pub use abc::{AbcClass, AbcRow, classify_abc};
pub use anomaly::{DeliveryAnomaly, TransitBaseline, detect_delivery_anomalies};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{AnalyticsEngine, EngineConfig};
pub use error::{AnalyticsError, AnalyticsResult};
pub use forecast::{Forecast, ForecastMethod, ForecastPoint, forecast_next};
pub use query::{
    AnomalyQuery, ForecastQuery, RangeQuery, ReportHistoryQuery, SlowMoverQuery, SpaceUsageQuery,
    TrendQuery, TurnoverQuery, WarehouseScope,
};
pub use slow_movers::{SlowMover, slow_movers};
pub use source::{MovementFilter, ReportFilter, SourceError, WarehouseDataSource};
pub use space::{RackUtilization, SpaceUsage, rack_utilization, space_usage};
pub use timeliness::{CountTotal, OnTimeLate, classify_on_time_late};
pub use trend::{TrendPoint, bucket_counts, delivery_trends};
pub use turnover::{
    AgingBucket, AgingRow, ReceivingSpeed, TurnoverScope, inventory_aging, receiving_speed,
    stock_turnover,
};
pub use window::{Period, TimeWindow};
