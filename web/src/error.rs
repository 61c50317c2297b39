//! Error types for web handlers.
//!
//! [`AppError`] is the single boundary error. The `From` conversions decide
//! what a caller may learn: cart problems are specific, verification
//! failures are generic, and system faults become an opaque 500 whose
//! detail is only logged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use canteen_auth::AccessError;
use canteen_auth::constants::messages;
use canteen_orders::OrderError;
use serde::Serialize;
use std::fmt;

/// Generic message for every unexpected fault.
pub const GENERIC_FAILURE: &str = "An error occurred";

/// Message for malformed request bodies.
pub const INVALID_REQUEST_FORMAT: &str = "Invalid request format";

/// Application error type for web handlers.
///
/// Carries the status, a stable code for clients, the user-facing message
/// and an optional hidden source that is logged for 5xx responses.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach a source error for server-side logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    /// 429 Too Many Requests.
    #[must_use]
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message, "RATE_LIMITED")
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    success: bool,
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(status = %self.status, code = self.code, "Request failed"),
            }
        }

        let body = ErrorResponse {
            success: false,
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(GENERIC_FAILURE).with_source(err)
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::RateLimited { .. } => Self::too_many_requests(messages::TOO_MANY_ATTEMPTS),
            AccessError::InvalidInput { reason } => Self::bad_request(match reason {
                canteen_auth::InputProblem::Missing => messages::NO_DATA,
                canteen_auth::InputProblem::TooLong => messages::INVALID_FORMAT,
            }),
            AccessError::InvalidCode => Self::new(
                StatusCode::OK,
                messages::INVALID_OR_EXPIRED,
                "INVALID_CODE",
            ),
            AccessError::Unauthenticated => Self::forbidden(messages::NOT_AUTHENTICATED),
            AccessError::SessionExpired => Self::new(
                StatusCode::FORBIDDEN,
                messages::SESSION_EXPIRED,
                "SESSION_EXPIRED",
            ),
            AccessError::PassNotFound => Self::new(StatusCode::NOT_FOUND, "Pass not found", "NOT_FOUND"),
            other @ (AccessError::StoreUnavailable(_)
            | AccessError::DatabaseError(_)
            | AccessError::InternalError(_)) => {
                Self::internal(GENERIC_FAILURE).with_source(anyhow::Error::new(other))
            }
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        if err.is_cart_error() {
            return Self::new(StatusCode::BAD_REQUEST, err.to_string(), "INVALID_CART");
        }
        match err {
            OrderError::ProviderNotConfigured => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                "CHECKOUT_NOT_CONFIGURED",
            ),
            other => Self::internal(GENERIC_FAILURE).with_source(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_rate_limited_maps_to_429() {
        let err = AppError::from(AccessError::RateLimited {
            retry_after: Duration::from_secs(60),
        });
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message(), "Too many attempts. Please wait a minute.");
    }

    #[test]
    fn test_system_faults_are_opaque() {
        let err = AppError::from(AccessError::DatabaseError("connection refused".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), GENERIC_FAILURE);

        let err = AppError::from(OrderError::ProviderUnavailable("sk_live leaked?".into()));
        assert_eq!(err.message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_cart_errors_are_specific() {
        let err = AppError::from(OrderError::InsufficientStock {
            item_name: "Soup".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Insufficient stock for Soup");
    }

    #[test]
    fn test_session_errors_are_forbidden() {
        assert_eq!(
            AppError::from(AccessError::SessionExpired).message(),
            "Session expired"
        );
        assert_eq!(
            AppError::from(AccessError::Unauthenticated).status(),
            StatusCode::FORBIDDEN
        );
    }
}
