// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads ports, database URL, session/access secrets, and upstream settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment
//!
//! [`ServerConfig`] is built once at startup and shared read-only afterwards.
//! Both secrets (the session-signing key and the shared access secret) live
//! here and nowhere else.

use std::env;
use std::fmt;
use std::path::PathBuf;

use rand::distributions::Alphanumeric;
use rand::Rng;
use relay_core::constants::{auth, database, env_vars, llm, ports};
use relay_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string; anything that is not an explicit `sqlite:` URL is
    /// treated as a file path
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path_str = s.strip_prefix("sqlite://").or_else(|| s.strip_prefix("sqlite:"));
        match path_str.unwrap_or(s) {
            ":memory:" => Self::Memory,
            path => Self::SQLite {
                path: PathBuf::from(path),
            },
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => database::MEMORY_URL.to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::parse_url(database::DEFAULT_URL)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: DatabaseUrl,
}

/// Session token and access secret configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing key for session tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Session token lifetime in hours
    pub jwt_expiry_hours: i64,
    /// Deployment-wide access passphrase; `None` disables the access tier
    #[serde(skip_serializing)]
    pub access_secret: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("access_secret_configured", &self.access_secret.is_some())
            .finish()
    }
}

/// Upstream OpenAI-compatible provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Bearer key for the upstream API
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Active model
    pub model: String,
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key_configured", &self.api_key.is_some())
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated origins, or `*`
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "*".to_owned(),
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Upstream provider configuration
    pub llm: LlmConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed, or if
    /// `JWT_SECRET` is missing in production
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let environment =
            Environment::from_str_or_default(&env_var_or(env_vars::ENVIRONMENT, "development"));

        let config = Self {
            http_port: parse_env(env_vars::HTTP_PORT, ports::DEFAULT_HTTP_PORT)?,
            environment,
            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&env_var_or(
                    env_vars::DATABASE_URL,
                    database::DEFAULT_URL,
                )),
            },
            auth: AuthConfig {
                jwt_secret: load_jwt_secret(environment)?,
                jwt_expiry_hours: parse_env(
                    env_vars::JWT_EXPIRY_HOURS,
                    auth::SESSION_EXPIRY_HOURS,
                )?,
                access_secret: env_var_opt(env_vars::AUTH_SECRET_KEY),
            },
            llm: LlmConfig {
                base_url: env_var_or(env_vars::OPENAI_API_BASE_URL, llm::DEFAULT_BASE_URL),
                api_key: env_var_opt(env_vars::OPENAI_API_KEY),
                model: env_var_or(env_vars::OPENAI_API_MODEL, llm::DEFAULT_MODEL),
                timeout_ms: parse_env(env_vars::TIMEOUT_MS, llm::DEFAULT_TIMEOUT_MS)?,
            },
            cors: CorsConfig {
                allowed_origins: env_var_or(env_vars::CORS_ALLOWED_ORIGINS, "*"),
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if the session lifetime is outside
    /// `1..=MAX_SESSION_EXPIRY_HOURS` or the signing key is empty
    pub fn validate(&self) -> AppResult<()> {
        if !(1..=auth::MAX_SESSION_EXPIRY_HOURS).contains(&self.auth.jwt_expiry_hours) {
            return Err(AppError::config(format!(
                "JWT_EXPIRY_HOURS must be between 1 and {}",
                auth::MAX_SESSION_EXPIRY_HOURS
            )));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(AppError::config("JWT_SECRET must not be empty"));
        }
        if self.llm.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; upstream calls will be unauthenticated");
        }
        Ok(())
    }

    /// Whether the shared access secret tier is enabled
    #[must_use]
    pub const fn access_secret_enabled(&self) -> bool {
        self.auth.access_secret.is_some()
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Chat Relay Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - Session Lifetime: {}h\n\
             - Access Secret: {}\n\
             - Upstream: {} ({})\n\
             - Upstream Timeout: {}ms\n\
             - CORS Origins: {}",
            self.http_port,
            self.environment,
            self.database.url,
            self.auth.jwt_expiry_hours,
            if self.access_secret_enabled() {
                "Enabled"
            } else {
                "Disabled"
            },
            self.llm.base_url,
            self.llm.model,
            self.llm.timeout_ms,
            self.cors.allowed_origins,
        )
    }
}

/// Resolve the session signing key; production refuses to invent one
fn load_jwt_secret(environment: Environment) -> AppResult<String> {
    if let Some(secret) = env_var_opt(env_vars::JWT_SECRET) {
        return Ok(secret);
    }
    if environment.is_production() {
        return Err(AppError::config(
            "JWT_SECRET must be set in production; sessions cannot be signed",
        ));
    }
    warn!("JWT_SECRET not set; generated an ephemeral key, sessions will not survive restart");
    Ok(generate_secret())
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(auth::GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Get environment variable or default value; empty counts as unset
fn env_var_or(key: &str, default: &str) -> String {
    env_var_opt(key).unwrap_or_else(|| default.to_owned())
}

fn env_var_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    env_var_opt(key).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::errors::ErrorCode;
    use serial_test::serial;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("whatever"),
            Environment::Development
        );
    }

    #[test]
    fn test_database_url_parsing() {
        let file = DatabaseUrl::parse_url("sqlite:./test.db");
        assert!(!file.is_memory());
        assert_eq!(file.to_connection_string(), "sqlite:./test.db");

        assert!(DatabaseUrl::parse_url("sqlite::memory:").is_memory());

        let bare = DatabaseUrl::parse_url("data/relay.db");
        assert_eq!(bare.to_connection_string(), "sqlite:data/relay.db");
    }

    #[test]
    fn test_generated_secret_shape() {
        let secret = generate_secret();
        assert_eq!(secret.len(), auth::GENERATED_SECRET_LEN);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        for key in [
            env_vars::HTTP_PORT,
            env_vars::AUTH_SECRET_KEY,
            env_vars::OPENAI_API_MODEL,
            env_vars::TIMEOUT_MS,
            env_vars::ENVIRONMENT,
        ] {
            env::remove_var(key);
        }
        env::set_var(env_vars::JWT_SECRET, "unit-test-secret");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 3003);
        assert_eq!(config.auth.jwt_expiry_hours, 24);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.timeout_ms, 100_000);
        assert!(!config.access_secret_enabled());

        env::remove_var(env_vars::JWT_SECRET);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_port() {
        env::set_var(env_vars::HTTP_PORT, "not-a-port");
        let result = ServerConfig::from_env();
        env::remove_var(env_vars::HTTP_PORT);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_session_lifetime_bounds() {
        env::set_var(env_vars::JWT_SECRET, "unit-test-secret");

        env::set_var(env_vars::JWT_EXPIRY_HOURS, "8760");
        let longest = ServerConfig::from_env();

        env::set_var(env_vars::JWT_EXPIRY_HOURS, "8761");
        let too_long = ServerConfig::from_env();

        env::set_var(env_vars::JWT_EXPIRY_HOURS, "0");
        let zero = ServerConfig::from_env();

        env::remove_var(env_vars::JWT_EXPIRY_HOURS);
        env::remove_var(env_vars::JWT_SECRET);

        assert_eq!(longest.unwrap().auth.jwt_expiry_hours, 8760);
        assert_eq!(too_long.unwrap_err().code, ErrorCode::ConfigError);
        assert!(zero.is_err());
    }

    #[test]
    #[serial]
    fn test_production_requires_jwt_secret() {
        env::remove_var(env_vars::JWT_SECRET);
        env::set_var(env_vars::ENVIRONMENT, "production");
        let result = ServerConfig::from_env();
        env::remove_var(env_vars::ENVIRONMENT);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_blank_access_secret_is_disabled() {
        env::set_var(env_vars::AUTH_SECRET_KEY, "   ");
        env::set_var(env_vars::JWT_SECRET, "unit-test-secret");
        let config = ServerConfig::from_env().unwrap();
        env::remove_var(env_vars::AUTH_SECRET_KEY);
        env::remove_var(env_vars::JWT_SECRET);
        assert!(!config.access_secret_enabled());
    }
}
