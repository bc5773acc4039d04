//! Caller-facing errors.
//!
//! [`ApiError`] is the only error whose contents reach a response body. Any
//! other error a handler returns is treated as internal: it is logged in full
//! and the caller sees [`INTERNAL_ERROR_MESSAGE`] with status 500.

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Message sent to callers for every unclassified failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// An error a handler returns when it wants full control over the response.
///
/// The status and message are sent verbatim as
/// `{"error": "<message>"}` with the given status code.
///
/// # Example
///
/// ```
/// use bindery_core::ApiError;
/// use http::StatusCode;
///
/// fn check_owner(owner: &str, caller: &str) -> Result<(), ApiError> {
///     if owner != caller {
///         return Err(ApiError::forbidden("forbidden"));
///     }
///     Ok(())
/// }
///
/// let err = check_owner("alice", "bob").unwrap_err();
/// assert_eq!(err.status(), StatusCode::FORBIDDEN);
/// assert_eq!(err.message(), "forbidden");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates an error with an explicit status code.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 413 Payload Too Large error.
    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    /// Returns the status code sent to the caller.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message sent to the caller.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the wire body for this error.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody<'_> {
        ErrorBody {
            error: &self.message,
        }
    }
}

/// Wire shape of every error response: a single `error` field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorBody<'a> {
    /// The message shown to the caller.
    pub error: &'a str,
}

impl ErrorBody<'static> {
    /// The body sent for internal failures.
    #[must_use]
    pub const fn internal() -> Self {
        Self {
            error: INTERNAL_ERROR_MESSAGE,
        }
    }
}
