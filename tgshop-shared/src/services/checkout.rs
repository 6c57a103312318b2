/// Balance-paid checkout
///
/// Placing an order is a single unit of work:
///
/// 1. lock the buyer row (`SELECT ... FOR UPDATE`) and read the balance
/// 2. reject if the balance cannot cover the total
/// 3. insert the order, one row per line item, debit the balance and leave
///    an "order placed" notification
/// 4. commit
///
/// Any failure before the commit, for example a line item pointing at a
/// product that does not exist, rolls back every write of the attempt.
/// The row lock serializes concurrent orders by the same user, so two
/// requests can never both pass the balance check against a stale value.
///
/// # Pricing
///
/// Under [`PricingPolicy::Client`] the unit prices sent by the client are
/// charged as-is. [`PricingPolicy::Catalog`] re-reads `products.price` and
/// ignores client prices.
///
/// # Example
///
/// ```no_run
/// use tgshop_shared::models::order::NewOrderItem;
/// use tgshop_shared::services::checkout::{place_order, PricingPolicy};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let items = vec![NewOrderItem { product_id: 3, quantity: 1, price: 899 }];
/// let order = place_order(&pool, 7, items, PricingPolicy::Client).await?;
/// println!("order #{} total {}", order.id, order.total);
/// # Ok(())
/// # }
/// ```

use crate::{
    db::unit_of_work::UnitOfWork,
    models::{
        notification::{CreateNotification, Notification, NotificationType},
        order::{order_total, NewOrderItem, Order, OrderItem},
        product::Product,
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{collections::HashMap, fmt, str::FromStr};
use tracing::{info, warn};

/// Where unit prices come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingPolicy {
    /// Charge the prices sent with the order
    #[default]
    Client,

    /// Charge the current catalog prices
    Catalog,
}

impl FromStr for PricingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(PricingPolicy::Client),
            "catalog" => Ok(PricingPolicy::Catalog),
            other => Err(format!(
                "unknown pricing policy '{}', expected 'client' or 'catalog'",
                other
            )),
        }
    }
}

impl fmt::Display for PricingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingPolicy::Client => write!(f, "client"),
            PricingPolicy::Catalog => write!(f, "catalog"),
        }
    }
}

/// Error type for checkout
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("No items in order")]
    EmptyOrder,

    #[error("Order total is out of range")]
    TotalOutOfRange,

    /// Unknown or out-of-stock product (catalog pricing only)
    #[error("Product {0} is not available")]
    ProductUnavailable(i64),

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient balance")]
    InsufficientBalance { balance: i64, total: i64 },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Places an order paid from the user's balance
///
/// # Errors
///
/// - `EmptyOrder`, `TotalOutOfRange`, `ProductUnavailable`: bad input, no writes
/// - `UserNotFound`: `user_id` has no row
/// - `InsufficientBalance`: balance below total, no writes
/// - `Database`: store failure, the whole attempt is rolled back
pub async fn place_order(
    pool: &PgPool,
    user_id: i64,
    items: Vec<NewOrderItem>,
    pricing: PricingPolicy,
) -> Result<Order, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyOrder);
    }

    let mut uow = UnitOfWork::begin(pool).await?;

    let items = match pricing {
        PricingPolicy::Client => items,
        PricingPolicy::Catalog => {
            let ids: Vec<i64> = items.iter().map(|item| item.product_id).collect();
            let catalog = Product::find_in_stock_by_ids(uow.conn(), &ids).await?;
            apply_catalog_prices(items, &catalog)?
        }
    };

    let total = order_total(&items).ok_or(CheckoutError::TotalOutOfRange)?;

    let balance = User::lock_balance(uow.conn(), user_id)
        .await?
        .ok_or(CheckoutError::UserNotFound)?;

    if balance < total {
        warn!(user_id, balance, total, "Order rejected: insufficient balance");
        return Err(CheckoutError::InsufficientBalance { balance, total });
    }

    let order = Order::create(uow.conn(), user_id, total).await?;

    for item in &items {
        OrderItem::create(uow.conn(), order.id, item).await?;
    }

    let remaining = User::debit(uow.conn(), user_id, total)
        .await?
        .ok_or(CheckoutError::InsufficientBalance { balance, total })?;

    Notification::create(
        uow.conn(),
        CreateNotification {
            user_id,
            title: "Order placed".to_string(),
            message: format!(
                "Your order #{} for {}₽ has been placed successfully",
                order.id, total
            ),
            kind: NotificationType::Success,
        },
    )
    .await?;

    uow.commit().await?;

    info!(
        user_id,
        order_id = order.id,
        total,
        items = items.len(),
        remaining,
        %pricing,
        "Order placed"
    );

    Ok(order)
}

/// Replaces client prices with catalog prices
fn apply_catalog_prices(
    items: Vec<NewOrderItem>,
    catalog: &[Product],
) -> Result<Vec<NewOrderItem>, CheckoutError> {
    let prices: HashMap<i64, i64> = catalog.iter().map(|p| (p.id, p.price)).collect();

    items
        .into_iter()
        .map(|item| {
            let price = prices
                .get(&item.product_id)
                .copied()
                .ok_or(CheckoutError::ProductUnavailable(item.product_id))?;
            Ok(NewOrderItem { price, ..item })
        })
        .collect()
}
