// ABOUTME: Static deployment facts reported to clients before they authenticate
// ABOUTME: Whether the access-secret tier is configured and which model is active
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

/// Payload of the session endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// True when an access secret is configured
    pub auth: bool,
    /// Active model identifier
    pub model: String,
}

impl SessionConfig {
    /// Capture the facts once at startup
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            auth: config.access_secret_enabled(),
            model: config.llm.model.clone(),
        }
    }
}
