/// Uniform response envelope
///
/// Every response leaving the router goes through [`ApiResponse`]:
///
/// - `Access-Control-Allow-Origin: *` on every response
/// - `Content-Type: application/json` whenever there is a body
/// - the CORS preflight answer is a fixed 200 with an empty body
///
/// # Example
///
/// ```
/// use tgshop_api::response::ApiResponse;
/// use axum::http::StatusCode;
/// use serde_json::json;
///
/// let response = ApiResponse::created(json!({ "order": { "id": 1 } }));
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Origins allowed to call the API
pub const ALLOW_ORIGIN: &str = "*";

/// Methods announced in the preflight response
pub const ALLOW_METHODS: &str = "GET, POST, PUT, OPTIONS";

/// Request headers announced in the preflight response
pub const ALLOW_HEADERS: &str = "Content-Type, X-User-Id";

/// Preflight cache lifetime in seconds
pub const MAX_AGE: &str = "86400";

/// Response produced by the router
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status: StatusCode,
    body: Option<Value>,
    preflight: bool,
}

impl ApiResponse {
    /// JSON response with an explicit status
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
            preflight: false,
        }
    }

    /// 200 with a JSON body
    pub fn ok(body: Value) -> Self {
        Self::json(StatusCode::OK, body)
    }

    /// 201 with a JSON body
    pub fn created(body: Value) -> Self {
        Self::json(StatusCode::CREATED, body)
    }

    /// Fixed answer to an OPTIONS request
    pub fn preflight() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
            preflight: true,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Headers attached to this response
    pub fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        )];

        if self.body.is_some() {
            headers.push((
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ));
        }

        if self.preflight {
            headers.extend([
                (
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOW_METHODS),
                ),
                (
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                ),
                (
                    header::ACCESS_CONTROL_MAX_AGE,
                    HeaderValue::from_static(MAX_AGE),
                ),
            ]);
        }

        headers
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let headers = self.headers();
        let body = self
            .body
            .map(|value| value.to_string())
            .unwrap_or_default();

        let mut response = (self.status, body).into_response();
        // replaces the text/plain content type axum sets for String bodies
        response.headers_mut().remove(header::CONTENT_TYPE);
        for (name, value) in headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}
