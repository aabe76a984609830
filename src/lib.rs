// ABOUTME: Main library entry point for the chat relay server
// ABOUTME: Streams LLM completions to clients and keeps per-user conversation history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Chat Relay Server
//!
//! A small HTTP service in front of an OpenAI-compatible completion API.
//!
//! - Users register and log in; each login issues an HS256 session token.
//! - `POST /chat-process` relays one prompt upstream and streams every
//!   intermediate message state back as newline-separated JSON frames.
//! - Authenticated prompts are saved as chat turns once the stream finishes
//!   cleanly, and can be listed, replayed, or deleted later.
//!
//! ## Architecture
//!
//! - [`auth`]: identity resolution and the access-secret tier
//! - [`relay`]: the streaming relay and its framing
//! - [`llm`]: upstream provider abstraction and the OpenAI-compatible adapter
//! - [`database`]: `SQLite` storage for users and chat history
//! - [`routes`]: axum handlers, mounted at `/` and `/api`

/// Session tokens, password checks and the access secret
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// `SQLite` storage
pub mod database;

/// Upstream completion providers
pub mod llm;

/// Structured logging setup
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Streaming chat relay
pub mod relay;

/// Shared server state
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Listener and graceful shutdown
pub mod server;

/// Static session facts
pub mod session;

pub use relay_core::{constants, envelope, errors, models};
