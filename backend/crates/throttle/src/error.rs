//! Throttle Error Types
//!
//! This module provides throttle-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::sqlx_error_kind, kind::ErrorKind};
use thiserror::Error;

/// Throttle-specific result type alias
pub type ThrottleResult<T> = Result<T, ThrottleError>;

/// Throttle-specific error variants
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// The failure-timestamp query could not complete
    #[error("Audit query failed: {0}")]
    AuditQuery(#[source] sqlx::Error),

    /// An audit event could not be recorded
    #[error("Audit persistence failed: {0}")]
    AuditPersistence(#[source] sqlx::Error),

    /// The submission exceeded the failure rate and was blocked
    #[error("Access Denied for user [{username}] from IP Address [{client_ip}]")]
    Throttled { username: String, client_ip: String },

    /// Configuration rejected at construction
    #[error("Invalid throttle configuration: {0}")]
    InvalidConfig(String),

    /// Request parameters could not be read
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ThrottleError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ThrottleError::Throttled { .. } => ErrorKind::Locked,
            ThrottleError::InvalidSubmission(_) => ErrorKind::BadRequest,
            ThrottleError::AuditQuery(_) => ErrorKind::ServiceUnavailable,
            ThrottleError::AuditPersistence(e) => sqlx_error_kind(e),
            ThrottleError::InvalidConfig(_) | ThrottleError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            ThrottleError::AuditQuery(e) => {
                tracing::error!(error = %e, "Audit failure query error");
            }
            ThrottleError::AuditPersistence(e) => {
                tracing::error!(error = %e, "Audit persistence error");
            }
            ThrottleError::Internal(msg) | ThrottleError::InvalidConfig(msg) => {
                tracing::error!(message = %msg, "Throttle internal error");
            }
            ThrottleError::Throttled { username, client_ip } => {
                tracing::warn!(username = %username, client_ip = %client_ip, "Login submission throttled");
            }
            ThrottleError::InvalidSubmission(_) => {
                tracing::debug!(error = %self, "Throttle error");
            }
        }
    }
}

impl From<ThrottleError> for AppError {
    fn from(err: ThrottleError) -> Self {
        // Store errors stay in the logs; users only see the kind.
        match err {
            ThrottleError::Throttled { .. } => AppError::locked(err.to_string())
                .with_action("Wait before submitting your credentials again"),
            ThrottleError::InvalidSubmission(_) => AppError::bad_request(err.to_string()),
            ThrottleError::AuditQuery(source) => {
                AppError::service_unavailable("Audit store unavailable").with_source(source)
            }
            ThrottleError::AuditPersistence(source) => AppError::from(source),
            ThrottleError::InvalidConfig(_) | ThrottleError::Internal(_) => {
                AppError::internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ThrottleError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

impl From<platform::params::ParameterError> for ThrottleError {
    fn from(err: platform::params::ParameterError) -> Self {
        ThrottleError::InvalidSubmission(err.to_string())
    }
}
