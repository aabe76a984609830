// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory databases, test configuration, resources, and user helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `chat_relay_server`

use std::sync::{Arc, Once};

use anyhow::Result;
use chat_relay_server::{
    auth::{AuthGate, AuthManager, AuthSession},
    config::{
        AuthConfig, CorsConfig, DatabaseConfig, DatabaseUrl, Environment, LlmConfig, ServerConfig,
    },
    database::Database,
    llm::LlmProvider,
    resources::ServerResources,
};

static INIT_LOGGER: Once = Once::new();

/// Signing key shared by every test configuration
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

/// Access secret configured by [`test_config`]
pub const TEST_ACCESS_SECRET: &str = "open-sesame";

/// Model reported by [`test_config`]
pub const TEST_MODEL: &str = "gpt-test";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration pointing at an in-memory database
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: DatabaseUrl::Memory,
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_owned(),
            jwt_expiry_hours: 24,
            access_secret: Some(TEST_ACCESS_SECRET.to_owned()),
        },
        llm: LlmConfig {
            base_url: "http://127.0.0.1:9/v1".to_owned(),
            api_key: None,
            model: TEST_MODEL.to_owned(),
            timeout_ms: 1_000,
        },
        cors: CorsConfig::default(),
    }
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new(&DatabaseUrl::Memory).await?)
}

/// Test auth manager using the shared signing key
pub fn create_test_auth_manager() -> AuthManager {
    AuthManager::new(TEST_JWT_SECRET.as_bytes(), 24)
}

/// Auth gate over a database, with the test access secret configured
pub fn create_test_auth_gate(database: &Database) -> AuthGate {
    AuthGate::new(
        database.users(),
        create_test_auth_manager(),
        Some(TEST_ACCESS_SECRET.to_owned()),
    )
}

/// Full server resources around an in-memory database and a given provider
pub async fn create_test_resources(
    provider: Arc<dyn LlmProvider>,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    Ok(Arc::new(ServerResources::new(
        test_config(),
        database,
        provider,
    )))
}

/// Register a user named `username` with a derived email and password "pw"
pub async fn create_test_user(auth: &AuthGate, username: &str) -> Result<AuthSession> {
    Ok(auth
        .register(username, "pw", &format!("{username}@example.com"))
        .await?)
}
