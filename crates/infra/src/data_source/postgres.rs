//! Postgres-backed warehouse data source.
//!
//! Reads the operational tables owned by the warehouse service (`"Shipment"`,
//! `"StockMovement"`, `"InventoryItem"`, `"WarehouseItem"`, `"Location"`,
//! `"Warehouse"`, `"WarehouseReport"`). Every caller-supplied value is bound as
//! a statement parameter; optional filters use `$n IS NULL OR ...` guards so one
//! prepared statement serves every filter combination.
//!
//! ## Error Mapping
//!
//! | SQLx Error | SourceError |
//! |------------|-------------|
//! | PoolClosed / PoolTimedOut / Io / Tls / Configuration | `Connection` |
//! | ColumnNotFound / ColumnDecode / Decode / TypeNotFound | `Decode` |
//! | Database / other | `Query` |

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use stockscope_analytics::{
    MovementFilter, ReportFilter, SourceError, TimeWindow, WarehouseDataSource,
};
use stockscope_core::{
    DomainError, ItemId, LocationId, MovementId, ReportId, ShipmentId, WarehouseId,
};
use stockscope_warehouse::{
    InventoryItem, Location, MovementType, Shipment, ShipmentStatus, StockMovement, WarehouseItem,
    WarehouseReport,
};

use crate::config::InfraConfig;

/// Read-only warehouse queries over a Postgres pool.
///
/// `Send + Sync`; clones share the pool.
#[derive(Debug, Clone)]
pub struct PgDataSource {
    pool: Arc<PgPool>,
}

impl PgDataSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool sized from `config`.
    pub async fn connect(config: &InfraConfig) -> Result<Self, SourceError> {
        let url = config
            .database_url()
            .map_err(|e| SourceError::Connection(e.to_string()))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl WarehouseDataSource for PgDataSource {
    #[instrument(skip(self), fields(row_count), err)]
    async fn delivered_shipments(&self, window: &TimeWindow) -> Result<Vec<Shipment>, SourceError> {
        let rows = sqlx::query(
            r#"
            SELECT "id", "status"::text AS status, "shipmentDate", "deliveredAt"
            FROM "Shipment"
            WHERE "status"::text = $1
              AND "deliveredAt" BETWEEN $2 AND $3
            ORDER BY "deliveredAt" ASC, "id" ASC
            "#,
        )
        .bind(ShipmentStatus::Delivered.as_str())
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delivered_shipments", e))?;

        let shipments = rows
            .iter()
            .map(shipment_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Span::current().record("row_count", shipments.len());
        Ok(shipments)
    }

    #[instrument(skip(self), err)]
    async fn count_delivered(&self, window: &TimeWindow) -> Result<u64, SourceError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*)
            FROM "Shipment"
            WHERE "status"::text = $1
              AND "deliveredAt" BETWEEN $2 AND $3
            "#,
        )
        .bind(ShipmentStatus::Delivered.as_str())
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_delivered", e))?;
        to_u64("count", count)
    }

    #[instrument(skip(self), err)]
    async fn count_shipments_by_status(
        &self,
        statuses: &[ShipmentStatus],
    ) -> Result<u64, SourceError> {
        let tokens: Vec<&'static str> = statuses.iter().map(ShipmentStatus::as_str).collect();
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*)
            FROM "Shipment"
            WHERE "status"::text = ANY($1)
            "#,
        )
        .bind(tokens)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_shipments_by_status", e))?;
        to_u64("count", count)
    }

    #[instrument(skip(self), fields(row_count), err)]
    async fn stock_movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, SourceError> {
        let rows = sqlx::query(
            r#"
            SELECT "id", "itemId", "warehouseId", "type"::text AS type,
                   "quantity"::bigint AS quantity, "timestamp"
            FROM "StockMovement"
            WHERE ($1::uuid IS NULL OR "warehouseId" = $1)
              AND ($2::text IS NULL OR "type"::text = $2)
              AND ($3::timestamptz IS NULL OR "timestamp" >= $3)
              AND ($4::timestamptz IS NULL OR "timestamp" <= $4)
            ORDER BY "timestamp" ASC, "id" ASC
            "#,
        )
        .bind(filter.warehouse_id.map(|w| *w.as_uuid()))
        .bind(filter.movement_type.map(|t| t.as_str()))
        .bind(filter.occurred_after)
        .bind(filter.occurred_before)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_movements", e))?;

        let movements = rows
            .iter()
            .map(movement_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Span::current().record("row_count", movements.len());
        Ok(movements)
    }

    #[instrument(skip(self, item_ids), fields(requested = item_ids.len()), err)]
    async fn inventory_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<Vec<InventoryItem>, SourceError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = item_ids.iter().map(|i| *i.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT "id", "unitCost"::float8 AS unit_cost
            FROM "InventoryItem"
            WHERE "id" = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory_items", e))?;

        rows.iter().map(inventory_item_from_row).collect()
    }

    #[instrument(skip(self), fields(row_count), err)]
    async fn warehouse_items(
        &self,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<WarehouseItem>, SourceError> {
        let rows = sqlx::query(
            r#"
            SELECT "itemId", "warehouseId", "quantity"::bigint AS quantity,
                   "locationId", "maxThreshold"::bigint AS max_threshold
            FROM "WarehouseItem"
            WHERE ($1::uuid IS NULL OR "warehouseId" = $1)
            ORDER BY "warehouseId" ASC, "itemId" ASC
            "#,
        )
        .bind(warehouse_id.map(|w| *w.as_uuid()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("warehouse_items", e))?;

        let items = rows
            .iter()
            .map(warehouse_item_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Span::current().record("row_count", items.len());
        Ok(items)
    }

    #[instrument(skip(self, location_ids), fields(requested = location_ids.len()), err)]
    async fn locations(&self, location_ids: &[LocationId]) -> Result<Vec<Location>, SourceError> {
        if location_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = location_ids.iter().map(|l| *l.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT "id", COALESCE("zone", '') AS zone, "x", "y"
            FROM "Location"
            WHERE "id" = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("locations", e))?;

        rows.iter().map(location_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn warehouse_ids(&self) -> Result<Vec<WarehouseId>, SourceError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(r#"SELECT "id" FROM "Warehouse" ORDER BY "id""#)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("warehouse_ids", e))?;
        Ok(ids.into_iter().map(WarehouseId::from_uuid).collect())
    }

    #[instrument(skip(self), err)]
    async fn warehouse_reports(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<WarehouseReport>, SourceError> {
        let rows = sqlx::query(
            r#"
            SELECT "id", "warehouseId", "reportDate"::date AS report_date,
                   "totalSkus"::bigint AS total_skus, "totalQuantity"::bigint AS total_quantity
            FROM "WarehouseReport"
            WHERE ($1::uuid IS NULL OR "warehouseId" = $1)
              AND ($2::date IS NULL OR "reportDate"::date >= $2)
              AND ($3::date IS NULL OR "reportDate"::date <= $3)
            ORDER BY "reportDate" ASC, "warehouseId" ASC
            "#,
        )
        .bind(filter.warehouse_id.map(|w| *w.as_uuid()))
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("warehouse_reports", e))?;

        rows.iter().map(report_from_row).collect()
    }
}

fn shipment_from_row(row: &PgRow) -> Result<Shipment, SourceError> {
    let status: String = column(row, "status")?;
    Ok(Shipment {
        id: ShipmentId::from_uuid(column(row, "id")?),
        status: status.parse().map_err(decode_error)?,
        shipment_date: column::<Option<DateTime<Utc>>>(row, "shipmentDate")?,
        delivered_at: column::<Option<DateTime<Utc>>>(row, "deliveredAt")?,
    })
}

fn movement_from_row(row: &PgRow) -> Result<StockMovement, SourceError> {
    let movement_type: String = column(row, "type")?;
    let movement_type: MovementType = movement_type.parse().map_err(decode_error)?;
    StockMovement::new(
        MovementId::from_uuid(column(row, "id")?),
        ItemId::from_uuid(column(row, "itemId")?),
        WarehouseId::from_uuid(column(row, "warehouseId")?),
        movement_type,
        column(row, "quantity")?,
        column(row, "timestamp")?,
    )
    .map_err(decode_error)
}

fn inventory_item_from_row(row: &PgRow) -> Result<InventoryItem, SourceError> {
    InventoryItem::new(
        ItemId::from_uuid(column(row, "id")?),
        column(row, "unit_cost")?,
    )
    .map_err(decode_error)
}

fn warehouse_item_from_row(row: &PgRow) -> Result<WarehouseItem, SourceError> {
    Ok(WarehouseItem {
        item_id: ItemId::from_uuid(column(row, "itemId")?),
        warehouse_id: WarehouseId::from_uuid(column(row, "warehouseId")?),
        quantity: column(row, "quantity")?,
        location_id: column::<Option<Uuid>>(row, "locationId")?.map(LocationId::from_uuid),
        max_threshold: column(row, "max_threshold")?,
    })
}

fn location_from_row(row: &PgRow) -> Result<Location, SourceError> {
    Ok(Location::new(
        LocationId::from_uuid(column(row, "id")?),
        column::<String>(row, "zone")?,
        column(row, "x")?,
        column(row, "y")?,
    ))
}

fn report_from_row(row: &PgRow) -> Result<WarehouseReport, SourceError> {
    Ok(WarehouseReport {
        id: ReportId::from_uuid(column(row, "id")?),
        warehouse_id: WarehouseId::from_uuid(column(row, "warehouseId")?),
        report_date: column::<NaiveDate>(row, "report_date")?,
        total_skus: to_u64("total_skus", column(row, "total_skus")?)?,
        total_quantity: column(row, "total_quantity")?,
    })
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, SourceError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| SourceError::Decode(format!("column {name}: {e}")))
}

fn to_u64(name: &str, value: i64) -> Result<u64, SourceError> {
    u64::try_from(value).map_err(|_| SourceError::Decode(format!("{name} is negative: {value}")))
}

fn decode_error(err: DomainError) -> SourceError {
    SourceError::Decode(err.to_string())
}

/// Map SQLx errors onto the data-source error kinds.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> SourceError {
    match err {
        sqlx::Error::Database(db_err) => SourceError::Query(format!(
            "database error in {operation}: {}",
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            SourceError::Connection(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            SourceError::Connection(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Configuration(_) => {
            SourceError::Connection(format!("sqlx error in {operation}: {err}"))
        }
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => {
            SourceError::Decode(format!("sqlx error in {operation}: {err}"))
        }
        _ => SourceError::Query(format!("sqlx error in {operation}: {err}")),
    }
}
