/// Notification acknowledgement
///
/// # Endpoint
///
/// ```text
/// PUT /?action=notification
/// ```
///
/// # Request
///
/// ```json
/// { "notification_id": 3 }
/// ```
///
/// Always answers `{"success": true}`: a missing or unknown ID changes
/// nothing. Ownership is not checked.

use crate::{
    app::AppState,
    error::ApiResult,
    handler::decode_body,
    response::ApiResponse,
};
use serde::Deserialize;
use serde_json::json;
use tgshop_shared::models::notification::Notification;
use tracing::{debug, warn};

/// Acknowledgement request
#[derive(Debug, Default, Deserialize)]
pub struct NotificationAckRequest {
    pub notification_id: Option<i64>,
}

/// Marks a notification as read
pub async fn acknowledge(state: &AppState, body: &[u8]) -> ApiResult<ApiResponse> {
    let req: NotificationAckRequest = decode_body(body)?;

    match req.notification_id {
        Some(id) => {
            let updated = Notification::mark_read(&state.db, id).await?;
            if updated == 0 {
                warn!(notification_id = id, "Acknowledged unknown notification");
            } else {
                debug!(notification_id = id, "Notification marked read");
            }
        }
        None => warn!("Notification acknowledgement without notification_id"),
    }

    Ok(ApiResponse::ok(json!({ "success": true })))
}
