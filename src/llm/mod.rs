// ABOUTME: Upstream completion provider abstraction for the chat relay
// ABOUTME: Defines cumulative message state, the completion request, and the LlmProvider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Abstraction
//!
//! The relay consumes upstream output as a stream of [`RelayMessage`] values.
//! Each value is the **cumulative** state of the assistant message: its `text`
//! is everything generated so far, never just the newest piece. Providers whose
//! wire protocol sends incremental deltas fold them into cumulative state before
//! yielding, so the relay can always keep the last message it saw.

/// OpenAI-compatible chat completions adapter
pub mod openai_compatible;
/// Line-buffering SSE parser
pub mod sse_parser;

pub use openai_compatible::OpenAiCompatibleProvider;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use relay_core::errors::AppResult;
use serde::{Deserialize, Serialize};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction
    System,
    /// End-user prompt
    User,
    /// Model output
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Latest known state of the assistant message
///
/// Serialized as one frame of the relay stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    /// Upstream message identifier
    pub id: String,
    /// Always assistant for relayed output
    pub role: MessageRole,
    /// Full text generated so far
    pub text: String,
    /// Conversation the request belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Identifier of the prompt message this answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    /// Newest piece of text, when the upstream reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
    /// Raw upstream chunk, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// One completion request as the relay hands it to a provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// User prompt
    pub prompt: String,
    /// Optional system message
    pub system_message: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Nucleus sampling
    pub top_p: Option<f64>,
    /// Conversation the prompt belongs to
    pub conversation_id: Option<String>,
    /// Message the prompt follows
    pub parent_message_id: Option<String>,
}

/// Provider/model facts reported by the config endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    /// Provider name
    pub provider: String,
    /// Active model
    pub api_model: String,
    /// Upstream base URL
    pub base_url: String,
    /// Upstream timeout in milliseconds
    pub timeout_ms: u64,
}

/// Stream of cumulative message states
pub type MessageStream = Pin<Box<dyn Stream<Item = AppResult<RelayMessage>> + Send>>;

/// Upstream completion provider
///
/// Errors returned by `complete_stream` or yielded by the stream are upstream
/// failures; the relay reports them in-band and never retries.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider identifier used in logs
    fn name(&self) -> &'static str;

    /// Active model identifier
    fn default_model(&self) -> &str;

    /// Provider/model facts for the config endpoint
    fn config_summary(&self) -> ProviderSummary;

    /// Start a streaming completion
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the request cannot be started
    async fn complete_stream(&self, request: &CompletionRequest) -> AppResult<MessageStream>;
}
