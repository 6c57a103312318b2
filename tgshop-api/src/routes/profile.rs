/// Caller profile
///
/// # Endpoint
///
/// ```text
/// GET /?action=user
/// X-User-Id: <id>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user": { "id": 1, "balance": 1000, ... },
///   "referrals_count": 2,
///   "orders": [{ "id": 7, "total": 300, "items_count": 2, ... }],
///   "notifications": [{ "id": 3, "type": "success", ... }]
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    identity::Principal,
    response::ApiResponse,
};
use serde::Serialize;
use tgshop_shared::models::{
    notification::Notification,
    order::{Order, OrderSummary},
    user::User,
};

/// Most recent notifications included in a profile
pub const PROFILE_NOTIFICATION_LIMIT: i64 = 20;

/// Profile aggregate
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub referrals_count: i64,
    pub orders: Vec<OrderSummary>,
    pub notifications: Vec<Notification>,
}

/// Returns the caller's user record, referral count, orders and notifications
pub async fn get_profile(state: &AppState, principal: Option<Principal>) -> ApiResult<ApiResponse> {
    let principal = principal.ok_or_else(ApiError::unauthorized)?;

    let user = User::find_by_id(&state.db, principal.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let (referrals_count, orders, notifications) = tokio::try_join!(
        User::count_referrals(&state.db, user.id),
        Order::list_summaries_for_user(&state.db, user.id),
        Notification::list_recent_for_user(&state.db, user.id, PROFILE_NOTIFICATION_LIMIT),
    )?;

    let body = ProfileResponse {
        user,
        referrals_count,
        orders,
        notifications,
    };

    let body = serde_json::to_value(body)
        .map_err(|e| ApiError::InternalError(format!("Failed to encode profile: {}", e)))?;

    Ok(ApiResponse::ok(body))
}
