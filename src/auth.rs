// ABOUTME: JWT session tokens, user registration/login, and the shared access secret check
// ABOUTME: AuthManager signs and validates tokens; AuthGate resolves them to users via storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication and Session Management
//!
//! Two independent authorization tiers live here and are never merged:
//!
//! - **Session tokens**: HS256 JWTs bound to one user id, issued at register
//!   and login, resolved back to a user row on every verification. There is
//!   no session cache; every check is a storage round trip.
//! - **Access secret**: one deployment-wide passphrase compared by exact
//!   match, with its own failure code.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use relay_core::constants::{auth, messages};
use relay_core::errors::{AppError, AppResult, ErrorCode};
use relay_core::models::{User, UserSummary};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tokio::task;
use tracing::{debug, info, warn};

use crate::database::UserStore;

/// Convert a duration to a human-readable format
fn humanize_duration(duration: Duration) -> String {
    let total_secs = duration.num_seconds().abs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    if hours > 0 {
        format!("{hours} hours")
    } else if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        format!("{total_secs} seconds")
    }
}

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature or claims are invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => write!(
                f,
                "JWT token expired {} ago at {}",
                humanize_duration(current_time.signed_duration_since(*expired_at)),
                expired_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Self::TokenInvalid { reason } => write!(f, "JWT token is invalid: {reason}"),
            Self::TokenMalformed { details } => write!(f, "JWT token is malformed: {details}"),
        }
    }
}

impl std::error::Error for JwtValidationError {}

/// `JWT` claims for a user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl Claims {
    /// Parse the subject back into a user id
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Signs and validates HS256 session tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create a new authentication manager from the session signing key
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_hours,
        }
    }

    /// Generate a session token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the expiry overflows the timestamp range or JWT
    /// encoding fails
    pub fn generate_token(&self, user_id: i64) -> AppResult<String> {
        let now = Utc::now();
        let expiry = Duration::try_hours(self.token_expiry_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Session lifetime of {}h is out of range",
                    self.token_expiry_hours
                ))
            })?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// Validate a session token with detailed error information
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the token is malformed, the
    /// signature does not verify, or the token has expired
    pub fn validate_token_detailed(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let claims = self.decode_token_claims(token)?;
        Self::validate_claims_expiry(&claims)?;
        debug!(user_id = %claims.sub, "JWT token validation successful");
        Ok(claims)
    }

    /// Decode claims without expiration validation; expiry is checked
    /// separately so the error can carry the expiry time
    fn decode_token_claims(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            ErrorKind::Utf8(utf8_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid UTF-8: {utf8_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }

    fn validate_claims_expiry(claims: &Claims) -> Result<(), JwtValidationError> {
        let current_time = Utc::now();
        if current_time.timestamp() <= claims.exp {
            return Ok(());
        }
        let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(current_time);
        warn!(
            user_id = %claims.sub,
            "JWT token expired {} ago",
            humanize_duration(current_time.signed_duration_since(expired_at))
        );
        Err(JwtValidationError::TokenExpired {
            expired_at,
            current_time,
        })
    }
}

/// Result of a successful register or login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    /// Public user projection
    pub user: UserSummary,
    /// Session token
    pub token: String,
}

/// Resolves identities and guards both authorization tiers
#[derive(Clone)]
pub struct AuthGate {
    users: UserStore,
    tokens: AuthManager,
    access_secret: Option<String>,
}

impl AuthGate {
    /// Create the gate from its collaborators
    #[must_use]
    pub const fn new(users: UserStore, tokens: AuthManager, access_secret: Option<String>) -> Self {
        Self {
            users,
            tokens,
            access_secret,
        }
    }

    /// Token manager used for issuing sessions
    #[must_use]
    pub const fn tokens(&self) -> &AuthManager {
        &self.tokens
    }

    /// Register a new user and issue a session token
    ///
    /// # Errors
    ///
    /// Returns a validation error if a field is empty or the username or
    /// email is already registered
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> AppResult<AuthSession> {
        info!(username = %username, "User registration attempt");

        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(AppError::missing_field(
                "Username, password and email are required",
            ));
        }

        if self.users.username_or_email_taken(username, email).await? {
            return Err(AppError::already_exists(messages::USER_EXISTS));
        }

        let password = password.to_owned();
        let password_hash = task::spawn_blocking(move || bcrypt::hash(password, auth::BCRYPT_COST))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        // A concurrent registration can win between the check and the insert
        let user = self
            .users
            .create_user(username, email, &password_hash)
            .await
            .map_err(|e| {
                if e.code == ErrorCode::ConstraintViolation {
                    AppError::already_exists(messages::USER_EXISTS)
                } else {
                    e
                }
            })?;

        info!(user_id = user.id, "User registered successfully");
        self.issue_session(&user)
    }

    /// Check credentials and issue a fresh session token
    ///
    /// # Errors
    ///
    /// Returns an auth error if the username is unknown or the password
    /// does not match
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthSession> {
        info!(username = %username, "User login attempt");

        let user = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::user_not_found(messages::USER_NOT_FOUND))?;

        let candidate = password.to_owned();
        let password_hash = user.password_hash.clone();
        let is_valid = task::spawn_blocking(move || bcrypt::verify(&candidate, &password_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;

        if !is_valid {
            warn!(user_id = user.id, "Invalid password for login attempt");
            return Err(AppError::invalid_credentials(messages::INVALID_PASSWORD));
        }

        info!(user_id = user.id, "User logged in successfully");
        self.issue_session(&user)
    }

    /// Resolve a session token to its user
    ///
    /// # Errors
    ///
    /// Returns an `InvalidToken` error when the token is empty, malformed,
    /// expired, tampered, or names a user that no longer exists; returns a
    /// persistence error if the lookup itself fails
    pub async fn verify_token(&self, token: &str) -> AppResult<User> {
        if token.is_empty() {
            return Err(AppError::invalid_token(messages::INVALID_TOKEN));
        }

        let claims = self.tokens.validate_token_detailed(token).map_err(|e| {
            debug!(error = %e, "Session token rejected");
            AppError::invalid_token(messages::INVALID_TOKEN)
        })?;

        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::invalid_token(messages::INVALID_TOKEN))?;

        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::invalid_token(messages::INVALID_TOKEN))
    }

    /// Resolve the `Authorization` header, if any
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify_token`]; a missing header is `InvalidToken`
    pub async fn authenticate(&self, headers: &HeaderMap) -> AppResult<User> {
        let token = bearer_token(headers).unwrap_or_default();
        self.verify_token(token).await
    }

    /// Compare a candidate against the deployment access secret
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` for an empty candidate and
    /// `AccessSecretInvalid` when it does not match or no secret is configured
    pub fn verify_access_secret(&self, candidate: &str) -> AppResult<()> {
        if candidate.is_empty() {
            return Err(AppError::missing_field(messages::SECRET_KEY_EMPTY));
        }

        let matches = self
            .access_secret
            .as_deref()
            .is_some_and(|secret| bool::from(secret.as_bytes().ct_eq(candidate.as_bytes())));

        if matches {
            Ok(())
        } else {
            Err(AppError::access_secret_invalid(messages::SECRET_KEY_INVALID))
        }
    }

    fn issue_session(&self, user: &User) -> AppResult<AuthSession> {
        Ok(AuthSession {
            user: UserSummary::from(user),
            token: self.tokens.generate_token(user.id)?,
        })
    }
}

/// Extract the token from an `Authorization` header
///
/// The `Bearer ` prefix is optional; a bare token is accepted as-is.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(auth::BEARER_PREFIX).unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}
