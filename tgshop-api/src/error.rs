/// Error handling for the API server
///
/// This module provides a unified error type that maps to the response
/// envelope. Operations return `ApiResult<ApiResponse>`; the router turns the
/// error side into `{"error": <message>}` with the matching status.
///
/// | Variant | Status | Raised for |
/// |---|---|---|
/// | `BadRequest` | 400 | business rule violations, undecodable bodies |
/// | `ValidationError` | 400 | missing or out-of-range fields |
/// | `Unauthorized` | 401 | no trusted caller identity |
/// | `NotFound` | 404 | unknown user, unmatched route |
/// | `InternalError` | 500 | store failures |
///
/// # Example
///
/// ```
/// use tgshop_api::error::ApiError;
/// use axum::http::StatusCode;
///
/// let response = ApiError::BadRequest("Insufficient balance".to_string()).into_envelope(true);
/// assert_eq!(response.status(), StatusCode::BAD_REQUEST);
/// ```

use crate::response::ApiResponse;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tgshop_shared::services::{checkout::CheckoutError, registration::RegistrationError};
use validator::{ValidationErrors, ValidationErrorsKind};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned in place of internal error text when exposure is off
pub const SANITIZED_INTERNAL_MESSAGE: &str = "Internal server error";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Field validation failed (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation (`items[0].quantity` for nested fields)
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Every failed field, when more than one failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// The `{"error": ...}` message for `Unauthorized`
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error into the response envelope
    ///
    /// With `expose_internal` off, 500 bodies carry a fixed message instead
    /// of the store error text. Internal errors are logged either way.
    pub fn into_envelope(self, expose_internal: bool) -> ApiResponse {
        let status = self.status();

        let body = match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => {
                ErrorResponse {
                    error: msg,
                    details: None,
                }
            }
            ApiError::ValidationError(mut errors) => {
                errors.sort_by(|a, b| a.field.cmp(&b.field));
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string());
                let details = if errors.len() > 1 {
                    Some(errors)
                } else {
                    None
                };
                ErrorResponse {
                    error: message,
                    details,
                }
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorResponse {
                    error: if expose_internal {
                        msg
                    } else {
                        SANITIZED_INTERNAL_MESSAGE.to_string()
                    },
                    details: None,
                }
            }
        };

        let body = serde_json::to_value(body).unwrap_or_else(|_| {
            serde_json::json!({ "error": SANITIZED_INTERNAL_MESSAGE })
        });

        ApiResponse::json(status, body)
    }
}

/// Convert sqlx errors to API errors
///
/// Every store failure (connectivity, constraint violation, conflict) is a
/// 500; the handler never retries.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => ApiError::InternalError(db_err.message().to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Convert checkout errors to API errors
impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyOrder
            | CheckoutError::TotalOutOfRange
            | CheckoutError::ProductUnavailable(_)
            | CheckoutError::InsufficientBalance { .. } => ApiError::BadRequest(err.to_string()),
            CheckoutError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            CheckoutError::Database(e) => e.into(),
        }
    }
}

/// Convert registration errors to API errors
impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Database(e) => e.into(),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Convert validator derive output to API errors
///
/// Nested struct and list errors are flattened into dotted field paths and
/// sorted so the reported message does not depend on hash map order.
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_validation_details(&errors, "", &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

fn collect_validation_details(
    errors: &ValidationErrors,
    prefix: &str,
    out: &mut Vec<ValidationErrorDetail>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|error| ValidationErrorDetail {
                    field: path.clone(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path)),
                }));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_details(nested, &path, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_details(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}
