// ABOUTME: Centralized resource container shared by every route handler
// ABOUTME: Built once at startup from configuration, database, and upstream provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Every secret and collaborator is constructed here exactly once and handed to
//! the handlers through axum state. Nothing reads configuration ad hoc.

use std::sync::Arc;

use relay_core::errors::AppResult;

use crate::auth::{AuthGate, AuthManager};
use crate::config::ServerConfig;
use crate::database::{Database, ThreadStore};
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::relay::ChatRelay;
use crate::session::SessionConfig;

/// Shared server state
#[derive(Clone)]
pub struct ServerResources {
    /// Startup configuration
    pub config: Arc<ServerConfig>,
    /// Pool owner
    pub database: Database,
    /// Identity resolution and both authorization tiers
    pub auth: AuthGate,
    /// Conversation history
    pub threads: ThreadStore,
    /// Upstream completion provider
    pub provider: Arc<dyn LlmProvider>,
    /// Streaming relay
    pub relay: ChatRelay,
    /// Static facts for the session endpoint
    pub session: SessionConfig,
}

impl ServerResources {
    /// Wire resources around an already-open database and a chosen provider
    #[must_use]
    pub fn new(config: ServerConfig, database: Database, provider: Arc<dyn LlmProvider>) -> Self {
        let tokens = AuthManager::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.jwt_expiry_hours,
        );
        let auth = AuthGate::new(database.users(), tokens, config.auth.access_secret.clone());
        let threads = database.threads();
        let relay = ChatRelay::new(Arc::clone(&provider), threads.clone());
        let session = SessionConfig::new(&config);

        Self {
            config: Arc::new(config),
            database,
            auth,
            threads,
            provider,
            relay,
            session,
        }
    }

    /// Open the configured database and upstream client
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or the
    /// HTTP client cannot be built
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database.url).await?;
        let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatibleProvider::new(&config.llm)?);
        Ok(Self::new(config, database, provider))
    }
}
