// ABOUTME: Unified error handling with error codes, error kinds, and HTTP status mapping
// ABOUTME: AppError carries a stable code; the http-response feature renders it as a Fail envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Every failure in the relay is an [`AppError`] tagged with an [`ErrorCode`].
//! Codes are grouped into five [`ErrorKind`] families which decide how a
//! handler reacts: validation and auth failures are reported to the client
//! verbatim, persistence and internal failures are logged and replaced by a
//! generic message, and upstream failures only ever travel in-band on the
//! chat stream.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    /// Request body is malformed or a value is unusable
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// A required field is absent or empty
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    /// Username or email already registered
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists = 3002,

    // Authentication (1000-1999)
    /// Session token absent, malformed, expired, tampered or orphaned
    #[serde(rename = "AUTH_INVALID")]
    InvalidToken = 1000,
    /// Login attempted for an unknown username
    #[serde(rename = "USER_NOT_FOUND")]
    UserNotFound = 1001,
    /// Password check failed
    #[serde(rename = "INVALID_CREDENTIALS")]
    InvalidCredentials = 1002,
    /// Shared access secret does not match the deployment secret
    #[serde(rename = "ACCESS_SECRET_INVALID")]
    AccessSecretInvalid = 1003,

    // Persistence (4000-4999)
    /// Storage engine unavailable or query failed
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 4000,
    /// Integrity constraint rejected a write
    #[serde(rename = "CONSTRAINT_VIOLATION")]
    ConstraintViolation = 4001,

    // Upstream (5000-5999)
    /// Upstream provider returned an error
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// Upstream provider unreachable
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    /// Upstream provider rate limited the request
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5002,

    // Internal (9000-9999)
    /// Unclassified internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Configuration missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 9001,
    /// JSON encoding or decoding failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9002,
}

/// Failure families; each code belongs to exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Client sent something unusable
    Validation,
    /// Identity could not be established
    Auth,
    /// Storage failed
    Persistence,
    /// The completion provider failed
    Upstream,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Family this code belongs to
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::InvalidInput | Self::MissingRequiredField | Self::ResourceAlreadyExists => {
                ErrorKind::Validation
            }
            Self::InvalidToken
            | Self::UserNotFound
            | Self::InvalidCredentials
            | Self::AccessSecretInvalid => ErrorKind::Auth,
            Self::DatabaseError | Self::ConstraintViolation => ErrorKind::Persistence,
            Self::ExternalServiceError
            | Self::ExternalServiceUnavailable
            | Self::ExternalRateLimited => ErrorKind::Upstream,
            Self::InternalError | Self::ConfigError | Self::SerializationError => {
                ErrorKind::Internal
            }
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidInput | Self::MissingRequiredField | Self::ResourceAlreadyExists => 400,

            // 401 Unauthorized
            Self::InvalidToken
            | Self::UserNotFound
            | Self::InvalidCredentials
            | Self::AccessSecretInvalid => 401,

            // 429 Too Many Requests
            Self::ExternalRateLimited => 429,

            // 502 Bad Gateway
            Self::ExternalServiceError => 502,

            // 503 Service Unavailable
            Self::ExternalServiceUnavailable => 503,

            // 500 Internal Server Error
            Self::DatabaseError
            | Self::ConstraintViolation
            | Self::InternalError
            | Self::ConfigError
            | Self::SerializationError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::InvalidToken => "The provided session token is invalid",
            Self::UserNotFound => "User not found",
            Self::InvalidCredentials => "The provided credentials are invalid",
            Self::AccessSecretInvalid => "The access secret is invalid",
            Self::DatabaseError => "Database operation failed",
            Self::ConstraintViolation => "A storage constraint rejected the operation",
            Self::ExternalServiceError => "The completion service encountered an error",
            Self::ExternalServiceUnavailable => "The completion service is currently unavailable",
            Self::ExternalRateLimited => "The completion service rate limit was exceeded",
            Self::InternalError => "An internal server error occurred",
            Self::ConfigError => "Configuration error encountered",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
#[error("{}: {message}", code.description())]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Family of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Message safe to show a client
    ///
    /// Persistence and internal failures may carry SQL or file paths, so they
    /// collapse to the code's generic description.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Persistence | ErrorKind::Internal => self.code.description().to_owned(),
            ErrorKind::Validation | ErrorKind::Auth | ErrorKind::Upstream => self.message.clone(),
        }
    }
}

/// Convenience functions for creating common errors
impl AppError {
    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing or empty
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingRequiredField, message)
    }

    /// Unique identity already taken
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Invalid session token
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    /// Unknown user at login
    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UserNotFound, message)
    }

    /// Password mismatch
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCredentials, message)
    }

    /// Shared access secret mismatch
    pub fn access_secret_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AccessSecretInvalid, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Constraint violation
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConstraintViolation, message)
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// External service unreachable
    pub fn external_unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// External service rate limit
    pub fn external_rate_limited(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalRateLimited,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind as SqlxErrorKind;

        let integrity = error.as_database_error().is_some_and(|db| {
            matches!(
                db.kind(),
                SqlxErrorKind::UniqueViolation
                    | SqlxErrorKind::ForeignKeyViolation
                    | SqlxErrorKind::NotNullViolation
                    | SqlxErrorKind::CheckViolation
            )
        });
        if integrity {
            Self::constraint_violation(error.to_string()).with_source(error)
        } else {
            Self::database(error.to_string()).with_source(error)
        }
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use super::{AppError, ErrorKind};
    use crate::envelope::Envelope;
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use http::StatusCode;
    use tracing::{error, warn};

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            match self.kind() {
                ErrorKind::Persistence | ErrorKind::Internal => {
                    error!(code = ?self.code, error = %self, "request failed");
                }
                ErrorKind::Upstream => warn!(code = ?self.code, error = %self, "upstream failed"),
                ErrorKind::Validation | ErrorKind::Auth => {}
            }
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body: Envelope<()> = Envelope::fail(self.client_message());
            (status, Json(body)).into_response()
        }
    }
}
