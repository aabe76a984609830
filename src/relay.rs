// ABOUTME: Streaming chat relay that frames upstream message states for the client
// ABOUTME: Keeps the latest cumulative text and persists one turn after a clean finish
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Chat Relay
//!
//! Wire framing of the relay response body:
//!
//! ```text
//! {"id":"..","role":"assistant","text":"H"}
//! \n{"id":"..","role":"assistant","text":"He"}
//! \n{"id":"..","role":"assistant","text":"Hello"}
//! ```
//!
//! The first frame is a bare JSON object; every later frame is preceded by a
//! single newline. The stream ends when the connection closes. An upstream
//! failure is reported as one last frame shaped like a Fail envelope.
//!
//! The body is a pull-based stream: if the client goes away, the body is
//! dropped together with the upstream stream it owns, and nothing is saved.

use std::convert::Infallible;
use std::sync::Arc;

use async_stream::stream;
use bytes::{BufMut, Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use relay_core::constants::{messages, streaming::FRAME_SEPARATOR};
use relay_core::envelope::Envelope;
use relay_core::errors::{AppError, AppResult};
use relay_core::models::{NewChatTurn, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::database::ThreadStore;
use crate::llm::{CompletionRequest, LlmProvider};

/// Prior-context object sent by the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    /// Conversation to continue
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Message the prompt follows
    #[serde(default)]
    pub parent_message_id: Option<String>,
}

/// Body of the chat-process endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatProcessRequest {
    /// User prompt; must be non-empty
    #[serde(default)]
    pub prompt: String,
    /// Prior context
    #[serde(default)]
    pub options: ChatContext,
    /// Optional system message
    #[serde(default)]
    pub system_message: Option<String>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling
    #[serde(default, rename = "top_p")]
    pub top_p: Option<f64>,
}

impl ChatProcessRequest {
    fn completion(&self) -> CompletionRequest {
        CompletionRequest {
            prompt: self.prompt.clone(),
            system_message: self.system_message.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            conversation_id: self.options.conversation_id.clone(),
            parent_message_id: self.options.parent_message_id.clone(),
        }
    }

    fn into_turn(self, user_id: i64, response: String) -> NewChatTurn {
        NewChatTurn {
            user_id,
            conversation_id: self.options.conversation_id,
            parent_message_id: self.options.parent_message_id,
            prompt: self.prompt,
            response,
            system_message: self.system_message,
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }
}

/// Stream of encoded frames making up the response body
pub type FrameStream = std::pin::Pin<Box<dyn Stream<Item = Result<Bytes, Infallible>> + Send>>;

/// Relays one prompt to the upstream provider and frames the replies
#[derive(Clone)]
pub struct ChatRelay {
    provider: Arc<dyn LlmProvider>,
    threads: ThreadStore,
}

impl ChatRelay {
    /// Create a relay over a provider and the history store
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, threads: ThreadStore) -> Self {
        Self { provider, threads }
    }

    /// Validate the request and build the framed response body
    ///
    /// `user` is the resolved identity, if any; without one nothing is saved.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` when the prompt is empty. Upstream and
    /// storage failures never surface here; they happen inside the stream.
    pub fn start(&self, request: ChatProcessRequest, user: Option<User>) -> AppResult<FrameStream> {
        if request.prompt.is_empty() {
            return Err(AppError::missing_field(messages::PROMPT_REQUIRED));
        }

        let provider = Arc::clone(&self.provider);
        let threads = self.threads.clone();
        let user_id = user.map(|u| u.id);

        info!(
            provider = provider.name(),
            authenticated = user_id.is_some(),
            conversation_id = ?request.options.conversation_id,
            "Relaying chat prompt"
        );

        Ok(Box::pin(stream! {
            let mut frames = 0_usize;
            let mut response = String::new();

            let mut upstream = match provider.complete_stream(&request.completion()).await {
                Ok(upstream) => upstream,
                Err(e) => {
                    warn!(error = %e, "Upstream completion failed to start");
                    yield Ok(error_frame(frames, &e));
                    return;
                }
            };

            while let Some(item) = upstream.next().await {
                let message = match item {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(error = %e, frames, "Upstream stream failed");
                        yield Ok(error_frame(frames, &e));
                        return;
                    }
                };
                match encode_frame(frames, &message) {
                    Ok(frame) => {
                        frames += 1;
                        response = message.text;
                        yield Ok(frame);
                    }
                    Err(e) => {
                        yield Ok(error_frame(frames, &e));
                        return;
                    }
                }
            }

            debug!(frames, "Upstream stream finished");

            if let Some(user_id) = user_id {
                match threads.save(request.into_turn(user_id, response)).await {
                    Ok(turn) => debug!(chat_id = turn.id, user_id, "Chat turn persisted"),
                    Err(e) => warn!(error = %e, user_id, "Failed to persist chat turn"),
                }
            }
        }))
    }
}

/// Encode one frame; every frame after the first gets the separator prefix
///
/// # Errors
///
/// Returns a serialization error if `payload` cannot be encoded as JSON
pub fn encode_frame<T: Serialize>(index: usize, payload: &T) -> AppResult<Bytes> {
    let json = serde_json::to_vec(payload)?;
    let mut frame = BytesMut::with_capacity(json.len() + FRAME_SEPARATOR.len());
    if index > 0 {
        frame.put_slice(FRAME_SEPARATOR);
    }
    frame.put_slice(&json);
    Ok(frame.freeze())
}

fn error_frame(index: usize, error: &AppError) -> Bytes {
    let body: Envelope<()> = Envelope::fail(error.client_message());
    encode_frame(index, &body).unwrap_or_else(|_| {
        Bytes::from_static(br#"{"status":"Fail","message":"Internal server error","data":null}"#)
    })
}
