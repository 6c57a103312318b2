/// Trusted caller identity
///
/// Authentication happens upstream: whatever sits in front of this service
/// (the Telegram Mini App gateway) has already verified the caller and
/// forwards the internal user ID in `X-User-Id`. This module turns that
/// header into a [`Principal`] once, in middleware, so operations receive the
/// caller as a plain parameter and never look at transport headers.
///
/// A missing or non-numeric header yields no principal; operations that need
/// one answer 401.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Header carrying the pre-authenticated user ID
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
}

/// Request extension set by [`identity_layer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity(pub Option<Principal>);

/// Reads the principal from request headers
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let raw = headers.get(USER_ID_HEADER)?.to_str().ok()?.trim();

    match raw.parse::<i64>() {
        Ok(user_id) => Some(Principal { user_id }),
        Err(_) => {
            tracing::warn!(header = raw, "Ignoring malformed X-User-Id header");
            None
        }
    }
}

/// Middleware inserting [`Identity`] into request extensions
pub async fn identity_layer(mut req: Request, next: Next) -> Response {
    let identity = Identity(principal_from_headers(req.headers()));
    req.extensions_mut().insert(identity);
    next.run(req).await
}
