/// Database models for tgshop
///
/// Each module owns one table (or a parent/child pair) and its queries.
/// Query functions are generic over `sqlx::PgExecutor` so they run either on
/// the pool or inside a [`crate::db::unit_of_work::UnitOfWork`].
///
/// # Models
///
/// - `user`: customers, balances and referral links
/// - `product`: the catalog (read-only for the API)
/// - `order`: orders and their line items
/// - `notification`: per-user inbox messages
///
/// # Example
///
/// ```no_run
/// use tgshop_shared::models::product::{CategoryFilter, Product};
/// use tgshop_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let rpg = Product::list_in_stock(&pool, &CategoryFilter::from_query(Some("RPG"))).await?;
/// # Ok(())
/// # }
/// ```

pub mod notification;
pub mod order;
pub mod product;
pub mod user;
