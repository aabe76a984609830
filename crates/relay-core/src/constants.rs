// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for ports, auth, routes, streaming, and client messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 3003;
}

/// Authentication parameters
pub mod auth {
    /// bcrypt work factor for password hashes
    pub const BCRYPT_COST: u32 = 10;
    /// Session token lifetime
    pub const SESSION_EXPIRY_HOURS: i64 = 24;
    /// Longest accepted session lifetime (one year)
    pub const MAX_SESSION_EXPIRY_HOURS: i64 = 8760;
    /// Authorization header scheme prefix
    pub const BEARER_PREFIX: &str = "Bearer ";
    /// Length of a generated development signing key
    pub const GENERATED_SECRET_LEN: usize = 64;
}

/// Upstream completion defaults
pub mod llm {
    /// OpenAI-compatible API base URL
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
    /// Model used when none is configured
    pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
    /// Whole-request upstream timeout
    pub const DEFAULT_TIMEOUT_MS: u64 = 100_000;
    /// Upstream connect timeout
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Provider name used in logs and errors
    pub const PROVIDER_NAME: &str = "openai";
}

/// Chat stream framing
pub mod streaming {
    /// Separator written before every frame except the first
    pub const FRAME_SEPARATOR: &[u8] = b"\n";
    /// Content type of the relay response
    pub const CONTENT_TYPE: &str = "application/octet-stream";
}

/// API routes
pub mod routes {
    /// Prefix under which every route is mounted a second time
    pub const API_BASE: &str = "/api";
    /// Health route
    pub const HEALTH: &str = "/health";
    /// Registration
    pub const REGISTER: &str = "/register";
    /// Login
    pub const LOGIN: &str = "/login";
    /// Streaming relay
    pub const CHAT_PROCESS: &str = "/chat-process";
    /// History listing
    pub const CHAT_HISTORY: &str = "/chat-history";
    /// Conversation replay / single turn delete
    pub const CHAT_HISTORY_ITEM: &str = "/chat-history/:id";
    /// Whole conversation delete
    pub const CONVERSATION: &str = "/conversation/:conversation_id";
    /// Access secret check
    pub const VERIFY: &str = "/verify";
    /// Deployment facts
    pub const SESSION: &str = "/session";
    /// Provider configuration summary
    pub const CONFIG: &str = "/config";
}

/// Client-facing envelope messages
pub mod messages {
    /// Registration succeeded
    pub const REGISTRATION_SUCCESSFUL: &str = "Registration successful";
    /// Login succeeded
    pub const LOGIN_SUCCESSFUL: &str = "Login successful";
    /// Single turn delete succeeded
    pub const CHAT_DELETED: &str = "Chat deleted successfully";
    /// Conversation delete succeeded
    pub const CONVERSATION_DELETED: &str = "Conversation deleted successfully";
    /// Access secret accepted
    pub const VERIFY_SUCCESSFUL: &str = "Verify successfully";
    /// Access secret missing from request
    pub const SECRET_KEY_EMPTY: &str = "Secret key is empty";
    /// Access secret rejected
    pub const SECRET_KEY_INVALID: &str = "Secret key is invalid";
    /// Duplicate registration
    pub const USER_EXISTS: &str = "Username or email already exists";
    /// Unknown username at login
    pub const USER_NOT_FOUND: &str = "User not found";
    /// Wrong password
    pub const INVALID_PASSWORD: &str = "Invalid password";
    /// Session token rejected
    pub const INVALID_TOKEN: &str = "Invalid token";
    /// Prompt absent or empty
    pub const PROMPT_REQUIRED: &str = "Prompt is required";
}

/// Environment variable names
pub mod env_vars {
    /// Listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// sqlx database URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Session signing key
    pub const JWT_SECRET: &str = "JWT_SECRET";
    /// Session lifetime override
    pub const JWT_EXPIRY_HOURS: &str = "JWT_EXPIRY_HOURS";
    /// Shared access secret
    pub const AUTH_SECRET_KEY: &str = "AUTH_SECRET_KEY";
    /// Comma-separated CORS origins
    pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
    /// Upstream base URL
    pub const OPENAI_API_BASE_URL: &str = "OPENAI_API_BASE_URL";
    /// Upstream API key
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// Upstream model
    pub const OPENAI_API_MODEL: &str = "OPENAI_API_MODEL";
    /// Upstream timeout in milliseconds
    pub const TIMEOUT_MS: &str = "TIMEOUT_MS";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
}

/// Default database location
pub mod database {
    /// File-backed default URL
    pub const DEFAULT_URL: &str = "sqlite:./data/chat_relay.db";
    /// In-memory URL used by tests
    pub const MEMORY_URL: &str = "sqlite::memory:";
}
