/// Transport-neutral request router
///
/// The whole storefront API is one endpoint. A request names its operation
/// with the `action` query parameter, and the pair (method, action) selects
/// exactly one operation:
///
/// | Method | action | Operation |
/// |---|---|---|
/// | OPTIONS | any | CORS preflight, no store access |
/// | GET | `products` | list in-stock products |
/// | GET | `user` | caller profile (auth) |
/// | POST | `auth` | register or fetch by Telegram ID |
/// | POST | `order` | place an order (auth) |
/// | PUT | `notification` | mark a notification read |
///
/// Anything else is a 404. [`handle`] never fails: every error is rendered
/// into the response envelope.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    identity::Principal,
    response::ApiResponse,
    routes,
};
use axum::http::Method;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Inbound request, already stripped of transport details
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,

    /// Value of the `action` query parameter (empty if absent)
    pub action: String,

    /// Value of the `category` query parameter
    pub category: Option<String>,

    /// Caller vouched for by the upstream auth layer
    pub principal: Option<Principal>,

    /// Raw JSON body
    pub body: Bytes,
}

/// Operation selected for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Preflight,
    ListProducts,
    GetProfile,
    Register,
    PlaceOrder,
    AcknowledgeNotification,
    NotFound,
}

/// Selects the operation for a method and action
pub fn route(method: &Method, action: &str) -> Route {
    if *method == Method::OPTIONS {
        return Route::Preflight;
    }

    match (method.as_str(), action) {
        ("GET", "products") => Route::ListProducts,
        ("GET", "user") => Route::GetProfile,
        ("POST", "auth") => Route::Register,
        ("POST", "order") => Route::PlaceOrder,
        ("PUT", "notification") => Route::AcknowledgeNotification,
        _ => Route::NotFound,
    }
}

/// Routes, validates and executes one request
pub async fn handle(state: &AppState, req: ApiRequest) -> ApiResponse {
    let route = route(&req.method, &req.action);
    debug!(method = %req.method, action = %req.action, ?route, "Dispatching request");

    let result = match route {
        Route::Preflight => return ApiResponse::preflight(),
        Route::ListProducts => routes::products::list_products(state, req.category.as_deref()).await,
        Route::GetProfile => routes::profile::get_profile(state, req.principal).await,
        Route::Register => routes::auth::authenticate(state, &req.body).await,
        Route::PlaceOrder => routes::orders::place_order(state, req.principal, &req.body).await,
        Route::AcknowledgeNotification => {
            routes::notifications::acknowledge(state, &req.body).await
        }
        Route::NotFound => Err(ApiError::NotFound("Not found".to_string())),
    };

    result.unwrap_or_else(|err| err.into_envelope(state.config.api.expose_internal_errors))
}

/// Decodes a JSON request body into its typed form
///
/// An empty body decodes as `{}`, so structs whose fields are all optional
/// or defaulted accept it.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}
