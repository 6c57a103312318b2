/// Product model and catalog queries
///
/// The API never writes products; rows arrive through migrations or
/// back-office tooling. `Product::create` exists for seeding and tests.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     category VARCHAR(100) NOT NULL,
///     price BIGINT NOT NULL CHECK (price >= 0),
///     old_price BIGINT CHECK (old_price >= 0),
///     image_url VARCHAR(1024) NOT NULL DEFAULT '',
///     badge VARCHAR(50),
///     rating DOUBLE PRECISION NOT NULL DEFAULT 0,
///     in_stock BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

const PRODUCT_COLUMNS: &str = "id, title, description, category, price, old_price, \
     image_url, badge, rating, in_stock, created_at";

/// Category value that disables filtering
pub const ALL_CATEGORIES: &str = "all";

/// Catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,

    /// Current price in whole currency units
    pub price: i64,

    /// Crossed-out price shown next to a discount
    pub old_price: Option<i64>,

    pub image_url: String,

    /// Short label such as "-33%" or "NEW"
    pub badge: Option<String>,

    pub rating: f64,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: i64,
    pub old_price: Option<i64>,
    pub image_url: String,
    pub badge: Option<String>,
    pub rating: f64,
    pub in_stock: bool,
}

/// Category restriction for the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Every category
    All,

    /// Exactly this category (case-sensitive)
    Only(String),
}

impl CategoryFilter {
    /// Interprets the `category` query parameter
    ///
    /// Absent, empty and `"all"` all mean no restriction. The value is
    /// matched verbatim, surrounding whitespace included.
    pub fn from_query(category: Option<&str>) -> Self {
        match category {
            None | Some("") | Some(ALL_CATEGORIES) => CategoryFilter::All,
            Some(name) => CategoryFilter::Only(name.to_string()),
        }
    }
}

impl Product {
    /// Lists in-stock products, newest first
    pub async fn list_in_stock<'e, E>(
        executor: E,
        filter: &CategoryFilter,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        match filter {
            CategoryFilter::All => {
                let query = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE in_stock = TRUE \
                     ORDER BY created_at DESC, id DESC"
                );
                sqlx::query_as::<_, Product>(&query).fetch_all(executor).await
            }
            CategoryFilter::Only(category) => {
                let query = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE category = $1 AND in_stock = TRUE \
                     ORDER BY created_at DESC, id DESC"
                );
                sqlx::query_as::<_, Product>(&query)
                    .bind(category)
                    .fetch_all(executor)
                    .await
            }
        }
    }

    /// Fetches the in-stock products among `ids`
    ///
    /// Unknown or out-of-stock IDs are simply absent from the result.
    pub async fn find_in_stock_by_ids<'e, E>(
        executor: E,
        ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) AND in_stock = TRUE"
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Inserts a catalog entry
    pub async fn create<'e, E>(executor: E, data: CreateProduct) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            INSERT INTO products (title, description, category, price, old_price,
                                  image_url, badge, rating, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.category)
            .bind(data.price)
            .bind(data.old_price)
            .bind(data.image_url)
            .bind(data.badge)
            .bind(data.rating)
            .bind(data.in_stock)
            .fetch_one(executor)
            .await
    }
}
