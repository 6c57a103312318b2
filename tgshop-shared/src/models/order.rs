/// Order and order item models
///
/// Orders are written once, together with their items, by the checkout
/// service and never change afterwards.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE order_status AS ENUM ('completed');
///
/// CREATE TABLE orders (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     total BIGINT NOT NULL CHECK (total >= 0),
///     status order_status NOT NULL DEFAULT 'completed',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE order_items (
///     id BIGSERIAL PRIMARY KEY,
///     order_id BIGINT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
///     product_id BIGINT NOT NULL REFERENCES products(id),
///     quantity INTEGER NOT NULL CHECK (quantity > 0),
///     price BIGINT NOT NULL CHECK (price >= 0)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Order lifecycle state
///
/// Orders are paid from the balance at creation, so the only state is
/// `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Completed,
}

/// Placed order
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,

    /// Buyer
    pub user_id: i64,

    /// Sum of `price * quantity` over the items, debited from the balance
    pub total: i64,

    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Order row annotated with its number of line items (profile listing)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: i64,
    pub user_id: i64,
    pub total: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub items_count: i64,
}

/// Line item of an order
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,

    /// Unit price charged
    pub price: i64,
}

/// Input for inserting a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i32,
    pub price: i64,
}

impl Order {
    /// Inserts an order header in `completed` state
    pub async fn create<'e, E>(executor: E, user_id: i64, total: i64) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, total, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, total, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(total)
        .bind(OrderStatus::Completed)
        .fetch_one(executor)
        .await
    }

    /// Lists a user's orders with item counts, newest first
    pub async fn list_summaries_for_user<'e, E>(
        executor: E,
        user_id: i64,
    ) -> Result<Vec<OrderSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, OrderSummary>(
            r#"
            SELECT o.id, o.user_id, o.total, o.status, o.created_at,
                   COUNT(oi.id) AS items_count
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Counts a user's orders
    pub async fn count_for_user<'e, E>(executor: E, user_id: i64) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await
    }
}

impl OrderItem {
    /// Inserts one line item for `order_id`
    ///
    /// Fails with a foreign key violation when `product_id` is not in the
    /// catalog.
    pub async fn create<'e, E>(
        executor: E,
        order_id: i64,
        item: &NewOrderItem,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, product_id, quantity, price
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .fetch_one(executor)
        .await
    }

    /// Lists the items of an order
    pub async fn list_by_order<'e, E>(executor: E, order_id: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await
    }
}

impl NewOrderItem {
    /// `price * quantity`, or `None` on overflow
    pub fn line_total(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

/// Sums the line totals, or `None` if any step overflows
pub fn order_total(items: &[NewOrderItem]) -> Option<i64> {
    items
        .iter()
        .try_fold(0i64, |acc, item| acc.checked_add(item.line_total()?))
}
