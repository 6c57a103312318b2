/// Registration
///
/// Telegram has already authenticated the user; this endpoint maps a
/// Telegram ID onto a shop account, creating it on first contact.
///
/// # Endpoint
///
/// ```text
/// POST /?action=auth
/// ```
///
/// # Request
///
/// ```json
/// {
///   "telegram_id": 555,
///   "username": "alice",
///   "first_name": "Alice",
///   "referral_code": "1A2B3C4D"
/// }
/// ```
///
/// 201 with `{"user": ...}` for a new account, 200 for an existing one.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    handler::decode_body,
    response::ApiResponse,
};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tgshop_shared::services::registration::{self, Registration};
use validator::Validate;

/// Registration request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AuthRequest {
    /// Telegram user ID
    #[validate(
        required(message = "telegram_id is required"),
        range(min = 1, message = "telegram_id is required")
    )]
    pub telegram_id: Option<i64>,

    pub username: Option<String>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub photo_url: Option<String>,

    /// Code of the inviting user
    pub referral_code: Option<String>,
}

impl AuthRequest {
    fn into_registration(self, telegram_id: i64) -> Registration {
        Registration {
            telegram_id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            photo_url: self.photo_url,
            referral_code: self.referral_code,
        }
    }
}

/// Registers the caller, or returns the existing account
pub async fn authenticate(state: &AppState, body: &[u8]) -> ApiResult<ApiResponse> {
    let req: AuthRequest = decode_body(body)?;
    req.validate()?;

    let telegram_id = req
        .telegram_id
        .ok_or_else(|| ApiError::BadRequest("telegram_id is required".to_string()))?;

    let outcome = registration::register(&state.db, req.into_registration(telegram_id)).await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok(ApiResponse::json(status, json!({ "user": outcome.user })))
}
