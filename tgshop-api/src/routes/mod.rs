/// API route handlers
///
/// One module per operation; each takes typed inputs and returns
/// `ApiResult<ApiResponse>`:
///
/// - `products`: catalog listing
/// - `profile`: caller profile aggregate
/// - `auth`: registration
/// - `orders`: checkout
/// - `notifications`: read acknowledgement
/// - `health`: liveness and database check
///
/// [`dispatch`] adapts axum requests onto [`crate::handler::handle`].

pub mod auth;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod profile;

use crate::{
    app::AppState,
    error::ApiError,
    handler::{self, ApiRequest},
    identity::Identity,
    response::ApiResponse,
};
use axum::{
    extract::{rejection::BytesRejection, Query, State},
    http::Method,
    Extension,
};
use bytes::Bytes;

/// Query parameters understood by the router
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionQuery {
    /// Operation name, empty if absent
    pub action: String,

    pub category: Option<String>,
}

impl ActionQuery {
    /// Builds the query from decoded key/value pairs
    ///
    /// The first occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut action = None;
        let mut category = None;

        for (key, value) in pairs {
            match key.as_str() {
                "action" if action.is_none() => action = Some(value),
                "category" if category.is_none() => category = Some(value),
                _ => {}
            }
        }

        Self {
            action: action.unwrap_or_default(),
            category,
        }
    }
}

/// Axum entry point for every request outside `/health`
///
/// Mounted on `/` and as the router fallback, so any path reaches the route
/// table. Extractor failures are rendered through the response envelope.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    query: Option<Query<Vec<(String, String)>>>,
    identity: Option<Extension<Identity>>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResponse {
    let query = query
        .map(|Query(pairs)| ActionQuery::from_pairs(pairs))
        .unwrap_or_default();
    let principal = identity.and_then(|Extension(Identity(principal))| principal);

    let body = match body {
        Ok(body) => body,
        Err(_) if method == Method::OPTIONS => Bytes::new(),
        Err(rejection) => {
            return ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
                .into_envelope(state.config.api.expose_internal_errors);
        }
    };

    handler::handle(
        &state,
        ApiRequest {
            method,
            action: query.action,
            category: query.category,
            principal,
            body,
        },
    )
    .await
}
