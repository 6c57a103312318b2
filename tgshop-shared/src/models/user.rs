/// User model and database operations
///
/// A user is created once per Telegram identity and carries the shop balance
/// plus the referral link to whoever invited them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     telegram_id BIGINT NOT NULL UNIQUE,
///     username VARCHAR(255),
///     first_name VARCHAR(255),
///     last_name VARCHAR(255),
///     photo_url VARCHAR(1024),
///     balance BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
///     referral_code VARCHAR(8) NOT NULL UNIQUE,
///     referred_by_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tgshop_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_by_telegram_id(&pool, 555).await? {
///     println!("{} has {} on balance", user.referral_code, user.balance);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

const USER_COLUMNS: &str = "id, telegram_id, username, first_name, last_name, photo_url, \
     balance, referral_code, referred_by_id, created_at";

/// Shop customer
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Internal user ID, sent back by clients in `X-User-Id`
    pub id: i64,

    /// Telegram user ID (natural key for registration)
    pub telegram_id: i64,

    /// Telegram @username
    pub username: Option<String>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Avatar URL supplied by Telegram
    pub photo_url: Option<String>,

    /// Spendable balance in whole currency units, never negative
    pub balance: i64,

    /// Public 8-character code other users register with
    pub referral_code: String,

    /// User whose code was redeemed at registration
    pub referred_by_id: Option<i64>,

    pub created_at: DateTime<Utc>,
}

/// Input for inserting a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
    pub referral_code: String,
    pub referred_by_id: Option<i64>,
    pub balance: i64,
}

impl User {
    /// Inserts a user unless one already exists for the Telegram ID
    ///
    /// Returns `None` when another row already owns `telegram_id`, which lets
    /// a racing registration fall back to the existing account. Any other
    /// unique violation (a referral code collision) is returned as an error.
    pub async fn create_if_absent<'e, E>(
        executor: E,
        data: CreateUser,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, photo_url,
                               referral_code, referred_by_id, balance)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (telegram_id) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.telegram_id)
            .bind(data.username)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.photo_url)
            .bind(data.referral_code)
            .bind(data.referred_by_id)
            .bind(data.balance)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by internal ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by Telegram ID
    pub async fn find_by_telegram_id<'e, E>(
        executor: E,
        telegram_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(telegram_id)
            .fetch_optional(executor)
            .await
    }

    /// Finds the owner of a referral code (exact match)
    pub async fn find_by_referral_code<'e, E>(
        executor: E,
        referral_code: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE referral_code = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(referral_code)
            .fetch_optional(executor)
            .await
    }

    /// Reads the balance and takes a row lock on the user
    ///
    /// Must run inside a unit of work; the lock is held until it commits or
    /// rolls back, which serializes concurrent orders from the same user.
    pub async fn lock_balance<'e, E>(executor: E, id: i64) -> Result<Option<i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>("SELECT balance FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Adds `amount` to the balance, returning the new balance
    pub async fn credit<'e, E>(executor: E, id: i64, amount: i64) -> Result<Option<i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET balance = balance + $2
            WHERE id = $1
            RETURNING balance
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(executor)
        .await
    }

    /// Subtracts `amount` from the balance, returning the new balance
    ///
    /// Returns `None` if the user does not exist or cannot cover `amount`;
    /// the balance is never taken below zero.
    pub async fn debit<'e, E>(executor: E, id: i64, amount: i64) -> Result<Option<i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET balance = balance - $2
            WHERE id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(executor)
        .await
    }

    /// Counts users who registered with this user's referral code
    pub async fn count_referrals<'e, E>(executor: E, id: i64) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE referred_by_id = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Display name assembled from the Telegram profile fields
    pub fn display_name(&self) -> String {
        let full: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();

        if !full.is_empty() {
            return full.join(" ");
        }

        self.username
            .clone()
            .unwrap_or_else(|| format!("user{}", self.telegram_id))
    }
}
