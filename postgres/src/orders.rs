//! `PostgreSQL` catalog and order store.
//!
//! # Atomic commit
//!
//! [`OrderStore::commit_order`] runs in one transaction:
//!
//! 1. `SELECT ... FOR UPDATE` on the cart's catalog rows, in id order so two
//!    overlapping carts always lock in the same sequence
//! 2. re-validate availability and stock against the locked rows
//! 3. insert the order with a zero total, then its lines with snapshotted
//!    name and price
//! 4. decrement stock, clamped at zero
//! 5. set the order total to the sum of line totals
//!
//! Any error drops the transaction, which rolls everything back.

use canteen_core::Money;
use canteen_orders::cart;
use canteen_orders::providers::{Catalog, OrderStore, StoreFuture};
use canteen_orders::types::{
    CatalogItem, CatalogItemId, NewOrder, Order, OrderId, OrderLine, OrderSummary, ValidatedCart,
};
use canteen_orders::{OrderError, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Instant;

const ORDER_COLUMNS: &str = "id, owner_label, created_at, status, payment_method, payment_status, \
     total_amount_cents, external_checkout_ref, paid_at";

/// `PostgreSQL` implementation of [`Catalog`] and [`OrderStore`].
#[derive(Clone, Debug)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn commit(&self, cart: &ValidatedCart, new: NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let quantities = cart.quantities();
        let ids: Vec<i64> = quantities.keys().map(|id| id.0).collect();
        let rows = sqlx::query(
            "SELECT id, name, price_cents, stock_count, is_available
             FROM catalog_items
             WHERE id = ANY($1)
             ORDER BY id
             FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
        let locked = rows.iter().map(item_from_row).collect::<Result<Vec<_>>>()?;

        let revalidated = cart::resolve(&quantities, &locked)?;

        let order_id = insert_header(&mut tx, &new).await?;

        let mut lines = Vec::with_capacity(revalidated.lines().len());
        let mut total = Money::ZERO;
        for line in revalidated.lines() {
            let order_line = OrderLine {
                item_id: line.item.id,
                item_name: line.item.name.clone(),
                quantity: line.quantity,
                unit_price: line.item.price,
            };
            total = order_line
                .line_total()
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| OrderError::Internal("Order total overflow".to_string()))?;

            sqlx::query(
                "INSERT INTO order_lines (order_id, catalog_item_id, item_name, quantity, unit_price_cents)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id)
            .bind(order_line.item_id.0)
            .bind(&order_line.item_name)
            .bind(to_i32(order_line.quantity)?)
            .bind(to_i64(order_line.unit_price.cents())?)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            sqlx::query(
                "UPDATE catalog_items SET stock_count = GREATEST(stock_count - $1, 0) WHERE id = $2",
            )
            .bind(to_i32(order_line.quantity)?)
            .bind(order_line.item_id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            lines.push(order_line);
        }

        sqlx::query("UPDATE orders SET total_amount_cents = $1 WHERE id = $2")
            .bind(to_i64(total.cents())?)
            .bind(order_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        tracing::debug!(order_id, lines = lines.len(), "Order transaction committed");

        Ok(Order {
            id: OrderId(order_id),
            owner_label: new.owner_label,
            created_at: new.created_at,
            status: new.status,
            payment_method: new.payment_method,
            payment_status: new.payment_status,
            total_amount: total,
            external_checkout_ref: new.external_checkout_ref,
            paid_at: new.paid_at,
            lines,
        })
    }

    async fn load_lines(&self, order_id: i64) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            "SELECT catalog_item_id, item_name, quantity, unit_price_cents
             FROM order_lines
             WHERE order_id = $1
             ORDER BY catalog_item_id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                let quantity: i32 = row.try_get("quantity").map_err(db_error)?;
                let unit_price: i64 = row.try_get("unit_price_cents").map_err(db_error)?;
                Ok(OrderLine {
                    item_id: CatalogItemId(row.try_get("catalog_item_id").map_err(db_error)?),
                    item_name: row.try_get("item_name").map_err(db_error)?,
                    quantity: from_i32(quantity)?,
                    unit_price: Money::from_cents(from_i64(unit_price)?),
                })
            })
            .collect()
    }

    async fn load_order(&self, row: Option<PgRow>) -> Result<Option<Order>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = order_from_row(&row)?;
        order.lines = self.load_lines(order.id.0).await?;
        Ok(Some(order))
    }
}

async fn insert_header(tx: &mut Transaction<'static, Postgres>, new: &NewOrder) -> Result<i64> {
    let row = sqlx::query(
        "INSERT INTO orders
             (owner_label, created_at, status, payment_method, payment_status,
              total_amount_cents, external_checkout_ref, paid_at)
         VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
         RETURNING id",
    )
    .bind(&new.owner_label)
    .bind(new.created_at)
    .bind(new.status.as_str())
    .bind(new.payment_method.as_str())
    .bind(new.payment_status.as_str())
    .bind(&new.external_checkout_ref)
    .bind(new.paid_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            metrics::counter!("orders.duplicate_checkout_ref").increment(1);
            OrderError::ReconciliationFailed("order already exists for checkout".to_string())
        }
        other => db_error(other),
    })?;
    row.try_get("id").map_err(db_error)
}

fn db_error(e: sqlx::Error) -> OrderError {
    OrderError::DatabaseError(e.to_string())
}

fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| OrderError::Internal(format!("{value} out of range")))
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| OrderError::Internal(format!("{value} out of range")))
}

fn from_i32(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| OrderError::DatabaseError(format!("negative value {value}")))
}

fn from_i64(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| OrderError::DatabaseError(format!("negative value {value}")))
}

fn item_from_row(row: &PgRow) -> Result<CatalogItem> {
    let price: i64 = row.try_get("price_cents").map_err(db_error)?;
    let stock: i32 = row.try_get("stock_count").map_err(db_error)?;
    Ok(CatalogItem {
        id: CatalogItemId(row.try_get("id").map_err(db_error)?),
        name: row.try_get("name").map_err(db_error)?,
        price: Money::from_cents(from_i64(price)?),
        stock_count: from_i32(stock)?,
        is_available: row.try_get("is_available").map_err(db_error)?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    let status: String = row.try_get("status").map_err(db_error)?;
    let payment_method: String = row.try_get("payment_method").map_err(db_error)?;
    let payment_status: String = row.try_get("payment_status").map_err(db_error)?;
    let total: i64 = row.try_get("total_amount_cents").map_err(db_error)?;
    Ok(Order {
        id: OrderId(row.try_get("id").map_err(db_error)?),
        owner_label: row.try_get("owner_label").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        status: status.parse()?,
        payment_method: payment_method.parse()?,
        payment_status: payment_status.parse()?,
        total_amount: Money::from_cents(from_i64(total)?),
        external_checkout_ref: row.try_get("external_checkout_ref").map_err(db_error)?,
        paid_at: row.try_get("paid_at").map_err(db_error)?,
        lines: Vec::new(),
    })
}

impl Catalog for PostgresOrderStore {
    fn available_items(&self, ids: Option<Vec<CatalogItemId>>) -> StoreFuture<'_, Vec<CatalogItem>> {
        Box::pin(async move {
            let ids: Option<Vec<i64>> = ids.map(|ids| ids.into_iter().map(|id| id.0).collect());
            let rows = sqlx::query(
                "SELECT id, name, price_cents, stock_count, is_available
                 FROM catalog_items
                 WHERE is_available AND ($1::BIGINT[] IS NULL OR id = ANY($1))
                 ORDER BY name, id",
            )
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            rows.iter().map(item_from_row).collect()
        })
    }

    fn get_item(&self, id: CatalogItemId) -> StoreFuture<'_, Option<CatalogItem>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id, name, price_cents, stock_count, is_available
                 FROM catalog_items WHERE id = $1",
            )
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
            row.as_ref().map(item_from_row).transpose()
        })
    }
}

impl OrderStore for PostgresOrderStore {
    fn commit_order(&self, cart: ValidatedCart, order: NewOrder) -> StoreFuture<'_, Order> {
        Box::pin(async move {
            let start = Instant::now();
            let result = self.commit(&cart, order).await;
            metrics::histogram!("orders.commit.duration").record(start.elapsed().as_secs_f64());
            result
        })
    }

    fn get_order(&self, id: OrderId) -> StoreFuture<'_, Option<Order>> {
        Box::pin(async move {
            let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            self.load_order(row).await
        })
    }

    fn find_by_checkout_ref(&self, checkout_ref: String) -> StoreFuture<'_, Option<Order>> {
        Box::pin(async move {
            let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE external_checkout_ref = $1");
            let row = sqlx::query(&sql)
                .bind(&checkout_ref)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            self.load_order(row).await
        })
    }

    fn summary(&self) -> StoreFuture<'_, OrderSummary> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT
                     COALESCE(SUM(total_amount_cents) FILTER (WHERE payment_status = 'paid'), 0)::BIGINT
                         AS paid_total,
                     COUNT(*) FILTER (WHERE payment_status = 'paid') AS paid_count,
                     COUNT(*) FILTER (WHERE status = 'pending') AS pending_count
                 FROM orders",
            )
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

            let paid_total: i64 = row.try_get("paid_total").map_err(db_error)?;
            let paid_count: i64 = row.try_get("paid_count").map_err(db_error)?;
            let pending_count: i64 = row.try_get("pending_count").map_err(db_error)?;
            Ok(OrderSummary {
                paid_total: Money::from_cents(from_i64(paid_total)?),
                paid_count: from_i64(paid_count)?,
                pending_count: from_i64(pending_count)?,
            })
        })
    }
}
