//! Integration tests for the analytics pipeline.
//!
//! Tests: InMemoryDataSource → AnalyticsEngine → results / report sinks
//!
//! Verifies:
//! - Engine operations agree with the record fixtures
//! - Source failures, timeouts and cancellation surface as typed errors
//! - The daily report job skips failing warehouses and alerts on low stock

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use tokio_util::sync::CancellationToken;

    use stockscope_analytics::{
        AbcClass, AgingBucket, AnalyticsEngine, AnalyticsError, AnomalyQuery, EngineConfig,
        FixedClock, ForecastQuery, RangeQuery, ReportHistoryQuery, SlowMoverQuery, SourceError,
        SpaceUsage, SpaceUsageQuery, TrendQuery, TurnoverQuery, WarehouseScope,
    };
    use stockscope_core::{ItemId, LocationId, MovementId, ShipmentId, WarehouseId};
    use stockscope_warehouse::{
        InventoryItem, Location, MovementType, Shipment, ShipmentStatus, StockMovement,
        WarehouseItem, WarehouseReport,
    };

    use crate::data_source::{Fault, InMemoryDataSource};
    use crate::reports::{
        InMemoryAlertSink, InMemoryReportSink, ReportJobError, ReportRunSummary,
        WarehouseReportJob,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn engine(source: &Arc<InMemoryDataSource>) -> AnalyticsEngine<InMemoryDataSource> {
        AnalyticsEngine::new(source.clone()).with_clock(Arc::new(FixedClock(now())))
    }

    fn movement(
        item: ItemId,
        warehouse: WarehouseId,
        kind: MovementType,
        quantity: i64,
        ts: DateTime<Utc>,
    ) -> StockMovement {
        StockMovement::new(MovementId::new(), item, warehouse, kind, quantity, ts).unwrap()
    }

    fn june(start_day: u32, end_day: u32) -> RangeQuery {
        RangeQuery::new(
            Some(&format!("2024-06-{start_day:02}")),
            Some(&format!("2024-06-{end_day:02}T23:59:59Z")),
        )
    }

    #[tokio::test]
    async fn on_time_and_late_never_exceed_completed() {
        let source = Arc::new(InMemoryDataSource::new());
        // on time, late, late, no promised date
        source.insert_shipment(Shipment::delivered(ShipmentId::new(), Some(at(5, 12)), at(5, 10)));
        source.insert_shipment(Shipment::delivered(ShipmentId::new(), Some(at(5, 12)), at(6, 10)));
        source.insert_shipment(Shipment::delivered(ShipmentId::new(), Some(at(7, 0)), at(9, 0)));
        source.insert_shipment(Shipment::delivered(ShipmentId::new(), None, at(9, 0)));
        // outside the window
        source.insert_shipment(Shipment::delivered(ShipmentId::new(), Some(at(20, 0)), at(20, 0)));

        let engine = engine(&source);
        let range = june(1, 10);
        let split = engine.on_time_late(&range).await.unwrap();
        let completed = engine.completed_count(&range).await.unwrap();

        assert_eq!((split.on_time, split.late), (1, 2));
        assert_eq!(completed.total, 4);
        assert!(split.on_time + split.late <= completed.total);
    }

    #[tokio::test]
    async fn completed_count_adds_up_over_adjacent_windows() {
        let source = Arc::new(InMemoryDataSource::new());
        for (day, hour) in [(1, 0), (4, 9), (10, 23), (11, 0), (15, 12), (20, 23), (21, 0)] {
            source.insert_shipment(Shipment::delivered(ShipmentId::new(), None, at(day, hour)));
        }

        let engine = engine(&source);
        let first = engine.completed_count(&june(1, 10)).await.unwrap().total;
        let second = engine.completed_count(&june(11, 20)).await.unwrap().total;
        let whole = engine.completed_count(&june(1, 20)).await.unwrap().total;

        assert_eq!((first, second), (3, 3));
        assert_eq!(first + second, whole);
    }

    #[tokio::test]
    async fn in_transit_is_a_current_snapshot() {
        let source = Arc::new(InMemoryDataSource::new());
        for status in [
            ShipmentStatus::InTransit,
            ShipmentStatus::OutForDelivery,
            ShipmentStatus::Pending,
            ShipmentStatus::Returned,
        ] {
            source.insert_shipment(Shipment::open(ShipmentId::new(), status, Some(at(1, 0))).unwrap());
        }
        source.insert_shipment(Shipment::delivered(ShipmentId::new(), None, at(2, 0)));

        let total = engine(&source).in_transit_count().await.unwrap().total;
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn trends_and_forecast_follow_daily_buckets() {
        let source = Arc::new(InMemoryDataSource::new());
        for (day, count) in [(1, 2), (2, 4), (3, 6), (4, 8)] {
            for _ in 0..count {
                source.insert_shipment(Shipment::delivered(ShipmentId::new(), None, at(day, 9)));
            }
        }
        let engine = engine(&source);

        let trends = engine
            .delivery_trends(&TrendQuery {
                start: Some("2024-06-01".into()),
                end: Some("2024-06-30".into()),
                period: Some("day".into()),
            })
            .await
            .unwrap();
        let labels: Vec<&str> = trends.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(labels, ["2024-06-01", "2024-06-02", "2024-06-03", "2024-06-04"]);
        assert_eq!(trends.iter().map(|p| p.count).sum::<u64>(), 20);

        let forecast = engine
            .forecast(&ForecastQuery {
                start: Some("2024-06-01".into()),
                period: Some("day".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let next = forecast.forecast.unwrap();
        assert_eq!(next.period, "2024-06-05");
        assert_eq!(next.count, 6);

        let short = engine
            .forecast(&ForecastQuery {
                start: Some("2024-06-01".into()),
                window: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(short.forecast.is_none());
        assert_eq!(short.trends.len(), 4);
    }

    #[tokio::test]
    async fn unusually_slow_delivery_is_flagged() {
        let source = Arc::new(InMemoryDataSource::new());
        for day in 1..=10 {
            source.insert_shipment(Shipment::delivered(
                ShipmentId::new(),
                Some(at(day, 0)),
                at(day, 20),
            ));
        }
        let slow = ShipmentId::new();
        source.insert_shipment(Shipment::delivered(slow, Some(at(1, 0)), at(25, 0)));

        let anomalies = engine(&source)
            .delivery_anomalies(&AnomalyQuery::default())
            .await
            .unwrap();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].id, slow);
        assert_eq!(anomalies[0].transit_secs, 24.0 * 86_400.0);
    }

    #[tokio::test]
    async fn turnover_counts_movements_in_scope() {
        let source = Arc::new(InMemoryDataSource::new());
        let (north, south) = (WarehouseId::new(), WarehouseId::new());
        let item = ItemId::new();
        source.insert_movement(movement(item, north, MovementType::Inbound, 5, at(3, 0)));
        source.insert_movement(movement(item, north, MovementType::Outbound, 2, at(3, 5)));
        source.insert_movement(movement(item, north, MovementType::Transfer, 1, at(4, 0)));
        source.insert_movement(movement(item, south, MovementType::Inbound, 9, at(3, 0)));
        let engine = engine(&source);

        let scoped = engine
            .stock_turnover(&TurnoverQuery {
                warehouse_id: Some(north),
                start: Some("2024-06-01".into()),
                end: Some("2024-06-10".into()),
                period: Some("day".into()),
            })
            .await
            .unwrap();
        let counts: Vec<(&str, u64)> = scoped.iter().map(|p| (p.period.as_str(), p.count)).collect();
        assert_eq!(counts, [("2024-06-03", 2), ("2024-06-04", 1)]);

        // Default scope is the trailing week, which holds none of these.
        let trailing = engine.stock_turnover(&TurnoverQuery::default()).await.unwrap();
        assert!(trailing.is_empty());

        // An unrecognised period with no bounds covers all time by day.
        let all = engine
            .stock_turnover(&TurnoverQuery {
                period: Some("fortnight".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.iter().map(|p| p.count).sum::<u64>(), 4);
    }

    #[tokio::test]
    async fn aging_partitions_inbound_quantity() {
        let source = Arc::new(InMemoryDataSource::new());
        let wh = WarehouseId::new();
        let item = ItemId::new();
        let received = [(10, 1), (31, 2), (45, 4), (90, 8)];
        for (days_ago, qty) in received {
            let ts = now() - chrono::Duration::days(days_ago);
            source.insert_movement(movement(item, wh, MovementType::Inbound, qty, ts));
        }
        source.insert_movement(movement(item, wh, MovementType::Outbound, 100, now()));

        let rows = engine(&source)
            .inventory_aging(&WarehouseScope::warehouse(wh))
            .await
            .unwrap();
        let totals: Vec<(AgingBucket, i64)> = rows.iter().map(|r| (r.bucket, r.total)).collect();
        assert_eq!(
            totals,
            [
                (AgingBucket::UpTo30, 1),
                (AgingBucket::UpTo60, 6),
                (AgingBucket::Over60, 8)
            ]
        );
        assert_eq!(rows.iter().map(|r| r.total).sum::<i64>(), 15);
    }

    #[tokio::test]
    async fn abc_ranks_outbound_value_against_the_catalog() {
        let source = Arc::new(InMemoryDataSource::new());
        let wh = WarehouseId::new();
        let (a, b, c) = (ItemId::new(), ItemId::new(), ItemId::new());
        source.insert_inventory_item(InventoryItem::new(a, 10.0).unwrap());
        source.insert_inventory_item(InventoryItem::new(b, 1.0).unwrap());
        source.insert_inventory_item(InventoryItem::new(c, 2.0).unwrap());
        // values: a = 700, b = 200, c = 100
        source.insert_movement(movement(b, wh, MovementType::Outbound, 200, at(1, 0)));
        source.insert_movement(movement(a, wh, MovementType::Outbound, 70, at(2, 0)));
        source.insert_movement(movement(c, wh, MovementType::Outbound, 50, at(3, 0)));
        source.insert_movement(movement(c, wh, MovementType::Inbound, 1_000, at(3, 0)));

        let rows = engine(&source)
            .abc_analysis(&WarehouseScope::all())
            .await
            .unwrap();
        let ranked: Vec<(ItemId, AbcClass)> = rows.iter().map(|r| (r.item_id, r.bucket)).collect();
        assert_eq!(ranked, [(a, AbcClass::A), (b, AbcClass::B), (c, AbcClass::C)]);
        assert!(rows.windows(2).all(|w| w[0].cumulative_percent <= w[1].cumulative_percent));
        assert!((rows[2].cumulative_percent - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn slow_movers_include_items_idle_in_the_window() {
        let source = Arc::new(InMemoryDataSource::new());
        let wh = WarehouseId::new();
        let (busy, quiet, idle) = (ItemId::new(), ItemId::new(), ItemId::new());
        for day in [20, 22, 25] {
            source.insert_movement(movement(busy, wh, MovementType::Outbound, 1, at(day, 0)));
        }
        source.insert_movement(movement(quiet, wh, MovementType::Outbound, 1, at(28, 0)));
        source.insert_movement(movement(
            idle,
            wh,
            MovementType::Outbound,
            1,
            now() - chrono::Duration::days(90),
        ));

        let slow = engine(&source)
            .slow_movers(&SlowMoverQuery::default())
            .await
            .unwrap();
        let found: Vec<(ItemId, u64)> = slow.iter().map(|s| (s.item_id, s.movement_count)).collect();
        assert_eq!(found, [(idle, 0), (quiet, 1)]);
    }

    #[tokio::test]
    async fn slow_movers_with_unbounded_lookback_count_all_history() {
        let source = Arc::new(InMemoryDataSource::new());
        let wh = WarehouseId::new();
        let (busy, idle) = (ItemId::new(), ItemId::new());
        for day in [20, 22] {
            source.insert_movement(movement(busy, wh, MovementType::Outbound, 1, at(day, 0)));
        }
        source.insert_movement(movement(
            idle,
            wh,
            MovementType::Outbound,
            1,
            now() - chrono::Duration::days(3650),
        ));

        let slow = engine(&source)
            .slow_movers(&SlowMoverQuery {
                days: Some(u32::MAX),
                ..Default::default()
            })
            .await
            .unwrap();
        let found: Vec<(ItemId, u64)> = slow.iter().map(|s| (s.item_id, s.movement_count)).collect();
        assert_eq!(found, [(idle, 1)]);

        let empty = Arc::new(InMemoryDataSource::new());
        let none = engine(&empty)
            .slow_movers(&SlowMoverQuery {
                days: Some(u32::MAX),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn rack_and_space_usage() {
        let source = Arc::new(InMemoryDataSource::new());
        let wh = WarehouseId::new();
        let cold = Location::new(LocationId::new(), "cold", 1, 1);
        let dry = Location::new(LocationId::new(), "dry", 2, 1);
        source.insert_location(cold.clone());
        source.insert_location(dry.clone());
        let (milk, rice) = (ItemId::new(), ItemId::new());
        source.insert_warehouse_item(
            WarehouseItem::new(milk, wh, 30)
                .at_location(cold.id)
                .with_max_threshold(120),
        );
        source.insert_warehouse_item(WarehouseItem::new(rice, wh, 50).at_location(dry.id));
        source.insert_warehouse_item(WarehouseItem::new(rice, wh, 20));
        source.insert_warehouse_item(WarehouseItem::new(milk, WarehouseId::new(), 999));
        let engine = engine(&source);

        let racks = engine.rack_utilization(wh).await.unwrap();
        assert_eq!(racks.len(), 2);
        assert_eq!(racks[0].utilization, 0.25);
        assert_eq!(racks[1].utilization, 1.0);

        let usage = engine
            .space_usage(&SpaceUsageQuery {
                warehouse_id: Some(wh),
                zone: None,
            })
            .await
            .unwrap();
        assert_eq!(
            usage,
            SpaceUsage {
                total_skus: 2,
                total_quantity: 100
            }
        );

        let cold_only = engine
            .space_usage(&SpaceUsageQuery {
                warehouse_id: Some(wh),
                zone: Some("cold".into()),
            })
            .await
            .unwrap();
        assert_eq!(cold_only.total_quantity, 30);
    }

    #[tokio::test]
    async fn receiving_speed_averages_gaps_between_receipts() {
        let source = Arc::new(InMemoryDataSource::new());
        let wh = WarehouseId::new();
        let item = ItemId::new();
        for hour in [0, 2, 7] {
            source.insert_movement(movement(item, wh, MovementType::Inbound, 1, at(10, hour)));
        }
        source.insert_movement(movement(item, wh, MovementType::Outbound, 1, at(11, 0)));

        let speed = engine(&source)
            .receiving_speed(&WarehouseScope::warehouse(wh))
            .await
            .unwrap();
        assert_eq!(speed.average_hours, 3.5);
    }

    #[tokio::test]
    async fn report_history_is_ordered_by_date() {
        let source = Arc::new(InMemoryDataSource::new());
        let wh = WarehouseId::new();
        for day in [3, 1, 2] {
            let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
            source.insert_report(WarehouseReport::snapshot(wh, date, 1, 10).unwrap());
        }

        let history = engine(&source)
            .warehouse_reports(&ReportHistoryQuery {
                warehouse_id: Some(wh),
                start: Some("2024-06-02".into()),
                end: None,
            })
            .await
            .unwrap();
        let days: Vec<u32> = history
            .iter()
            .map(|r| chrono::Datelike::day(&r.report_date))
            .collect();
        assert_eq!(days, [2, 3]);
    }

    #[tokio::test]
    async fn source_failures_propagate_unchanged() {
        let source = Arc::new(InMemoryDataSource::new());
        let failure = SourceError::Connection("connection refused".into());
        source.set_fault(Some(Fault::Fail(failure.clone())));

        let err = engine(&source)
            .abc_analysis(&WarehouseScope::all())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::Source {
                operation: "abc_analysis",
                source: failure,
            }
        );
    }

    #[tokio::test]
    async fn slow_queries_time_out() {
        let source = Arc::new(InMemoryDataSource::new());
        source.set_fault(Some(Fault::Stall(Duration::from_secs(5))));
        let engine = engine(&source).with_config(EngineConfig {
            query_timeout: Duration::from_millis(50),
        });

        let err = engine.in_transit_count().await.unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::TimedOut {
                operation: "in_transit_count",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancelled_requests_stop_waiting() {
        let source = Arc::new(InMemoryDataSource::new());
        source.set_fault(Some(Fault::Stall(Duration::from_secs(5))));
        let token = CancellationToken::new();
        let scoped = engine(&source).scoped(token.clone());

        let pending = tokio::spawn(async move { scoped.on_time_late(&RangeQuery::all_time()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::Cancelled {
                operation: "on_time_late"
            }
        );

        // The unscoped engine is unaffected.
        source.set_fault(None);
        assert!(engine(&source).on_time_late(&RangeQuery::all_time()).await.is_ok());
    }

    #[tokio::test]
    async fn report_job_snapshots_each_warehouse_and_alerts_on_low_stock() {
        let source = Arc::new(InMemoryDataSource::new());
        let (stocked, low, broken, empty) = (
            WarehouseId::new(),
            WarehouseId::new(),
            WarehouseId::new(),
            WarehouseId::new(),
        );
        source.insert_warehouse_item(WarehouseItem::new(ItemId::new(), stocked, 150));
        source.insert_warehouse_item(WarehouseItem::new(ItemId::new(), stocked, 50));
        source.insert_warehouse_item(WarehouseItem::new(ItemId::new(), low, 40));
        source.insert_warehouse_item(WarehouseItem::new(ItemId::new(), broken, 500));
        source.add_warehouse(empty);
        source.fail_warehouse(broken);

        let reports = Arc::new(InMemoryReportSink::new());
        let alerts = Arc::new(InMemoryAlertSink::new());
        let job = WarehouseReportJob::new(engine(&source), reports.clone(), alerts.clone());
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        let summary = job.run_once(date).await.unwrap();
        assert_eq!(
            summary,
            ReportRunSummary {
                generated: 3,
                already_recorded: 0,
                alerts: 2,
                failed: 1
            }
        );

        let saved = reports.all();
        assert_eq!(saved.len(), 3);
        assert!(saved.iter().all(|r| r.report_date == date));
        assert!(saved.iter().all(|r| r.warehouse_id != broken));
        let stocked_report = saved.iter().find(|r| r.warehouse_id == stocked).unwrap();
        assert_eq!((stocked_report.total_skus, stocked_report.total_quantity), (2, 200));

        let mut alerted: Vec<WarehouseId> = alerts.all().iter().map(|a| a.warehouse_id).collect();
        alerted.sort();
        let mut expected = vec![low, empty];
        expected.sort();
        assert_eq!(alerted, expected);
        assert!(alerts.all().iter().all(|a| a.threshold == 100));
    }

    #[tokio::test]
    async fn rerunning_a_report_date_keeps_one_snapshot_per_warehouse() {
        let source = Arc::new(InMemoryDataSource::new());
        let (low, stocked) = (WarehouseId::new(), WarehouseId::new());
        source.insert_warehouse_item(WarehouseItem::new(ItemId::new(), low, 10));
        source.insert_warehouse_item(WarehouseItem::new(ItemId::new(), stocked, 500));

        let reports = Arc::new(InMemoryReportSink::new());
        let alerts = Arc::new(InMemoryAlertSink::new());
        let job = WarehouseReportJob::new(engine(&source), reports.clone(), alerts.clone());
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        let first = job.run_once(date).await.unwrap();
        assert_eq!((first.generated, first.already_recorded, first.alerts), (2, 0, 1));

        let rerun = job.run_once(date).await.unwrap();
        assert_eq!(
            rerun,
            ReportRunSummary {
                generated: 0,
                already_recorded: 2,
                alerts: 0,
                failed: 0
            }
        );
        assert_eq!(reports.all().len(), 2);
        for wh in [low, stocked] {
            assert_eq!(reports.all().iter().filter(|r| r.warehouse_id == wh).count(), 1);
        }
        assert_eq!(alerts.all().len(), 1);

        let next_day = job.run_once(date.succ_opt().unwrap()).await.unwrap();
        assert_eq!((next_day.generated, next_day.alerts), (2, 1));
        assert_eq!(reports.all().len(), 4);
    }

    #[tokio::test]
    async fn report_job_threshold_is_strict() {
        let source = Arc::new(InMemoryDataSource::new());
        let wh = WarehouseId::new();
        source.insert_warehouse_item(WarehouseItem::new(ItemId::new(), wh, 25));

        let alerts = Arc::new(InMemoryAlertSink::new());
        let job = WarehouseReportJob::new(
            engine(&source),
            Arc::new(InMemoryReportSink::new()),
            alerts.clone(),
        )
        .with_low_stock_threshold(25);

        let summary = job
            .run_once(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
            .await
            .unwrap();
        assert_eq!(summary.alerts, 0);
        assert!(alerts.all().is_empty());
    }

    #[tokio::test]
    async fn report_job_aborts_when_warehouses_cannot_be_listed() {
        let source = Arc::new(InMemoryDataSource::new());
        source.set_fault(Some(Fault::Fail(SourceError::Query("relation missing".into()))));
        let reports = Arc::new(InMemoryReportSink::new());
        let job = WarehouseReportJob::new(
            engine(&source),
            reports.clone(),
            Arc::new(InMemoryAlertSink::new()),
        );

        let err = job
            .run_once(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportJobError::Warehouses(AnalyticsError::Source { .. })));
        assert!(reports.all().is_empty());
    }
}
