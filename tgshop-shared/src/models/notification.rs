/// Notification model and database operations
///
/// Notifications are created as side effects of referral credits and
/// completed orders, flipped to read by the client, and never deleted here.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_type AS ENUM ('success', 'info', 'warning');
///
/// CREATE TABLE notifications (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     message TEXT NOT NULL,
///     type notification_type NOT NULL DEFAULT 'info',
///     is_read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Visual category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Success,
    Info,
    Warning,
}

/// Inbox message for a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,

    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
}

impl Notification {
    /// Inserts an unread notification
    pub async fn create<'e, E>(executor: E, data: CreateNotification) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, title, message, type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, message, type, is_read, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.message)
        .bind(data.kind)
        .fetch_one(executor)
        .await
    }

    /// Most recent notifications of a user, newest first
    pub async fn list_recent_for_user<'e, E>(
        executor: E,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, title, message, type, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    /// Marks a notification as read
    ///
    /// Returns the number of rows changed (0 for an unknown ID). There is no
    /// ownership check: any caller can acknowledge any notification.
    pub async fn mark_read<'e, E>(executor: E, id: i64) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
