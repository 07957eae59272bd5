//! Orders projection: the denormalised listing behind `GET /api/orders`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{OrderItem, OrderPlacedData};
use serde::Serialize;
use sqlx::{PgPool, Row};

use crate::Result;

/// Default page size for recent-order listings.
pub const DEFAULT_LIMIT: usize = 50;

/// Upper bound on recent-order listings.
pub const MAX_LIMIT: usize = 500;

/// Normalises a caller-supplied limit: 0 means the default, anything
/// above the cap is clamped.
pub(crate) fn clamp_limit(limit: usize) -> i64 {
    let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
    limit.min(MAX_LIMIT) as i64
}

/// A projected order row with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderProjection {
    pub id: String,
    pub total_price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// The orders read model, updated by the broker-driven handlers.
///
/// Both writes are idempotent: redelivered messages must leave the
/// table in the same state they first produced.
#[async_trait]
pub trait OrderProjectionStore: Send + Sync {
    /// Upserts the row and line items for a placed order. `OrderPlaced`
    /// carries the full snapshot, so overwriting is safe; a row that has
    /// already moved to `confirmed` keeps its status.
    async fn upsert_placed(&self, event: &OrderPlacedData) -> Result<()>;

    /// Marks an order row as confirmed.
    async fn mark_confirmed(&self, order_id: &str) -> Result<()>;

    /// Lists the most recent orders with their line items.
    async fn list_recent(&self, limit: usize) -> Result<Vec<OrderProjection>>;
}

/// PostgreSQL-backed orders projection.
#[derive(Clone)]
pub struct PgOrderProjectionStore {
    pool: PgPool,
}

impl PgOrderProjectionStore {
    /// Creates a new PostgreSQL orders projection store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderProjectionStore for PgOrderProjectionStore {
    async fn upsert_placed(&self, event: &OrderPlacedData) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // The WHERE clause keeps a confirmed row confirmed when the
        // placed message is redelivered after the confirmation.
        sqlx::query(
            r#"
            INSERT INTO orders (id, total_price, status, created_at)
            VALUES ($1, $2, 'placed', $3)
            ON CONFLICT (id) DO UPDATE
                SET total_price = EXCLUDED.total_price
                WHERE orders.status <> 'confirmed'
            "#,
        )
        .bind(&event.order_id)
        .bind(event.total_price)
        .bind(event.placed_at)
        .execute(&mut *tx)
        .await?;

        // Line items are rewritten wholesale from the event snapshot.
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(&event.order_id)
            .execute(&mut *tx)
            .await?;

        for item in &event.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, name, price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&event.order_id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn mark_confirmed(&self, order_id: &str) -> Result<()> {
        sqlx::query("UPDATE orders SET status = 'confirmed' WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<OrderProjection>> {
        let rows = sqlx::query(
            "SELECT id, total_price, status, created_at FROM orders ORDER BY created_at DESC LIMIT $1",
        )
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(OrderProjection {
                id: row.try_get("id")?,
                total_price: row.try_get("total_price")?,
                status: row.try_get("status")?,
                created_at: row.try_get("created_at")?,
                items: Vec::new(),
            });
        }

        for order in &mut orders {
            let item_rows = sqlx::query(
                "SELECT product_id, name, price, quantity FROM order_items WHERE order_id = $1",
            )
            .bind(&order.id)
            .fetch_all(&self.pool)
            .await?;

            for row in item_rows {
                order.items.push(OrderItem {
                    product_id: row.try_get("product_id")?,
                    name: row.try_get("name")?,
                    price: row.try_get("price")?,
                    quantity: row.try_get::<i64, _>("quantity")? as u32,
                });
            }
        }

        Ok(orders)
    }
}
