// ABOUTME: OpenAI-compatible chat completions adapter producing cumulative message states
// ABOUTME: Streams SSE deltas from /chat/completions and folds them into the full text so far
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # OpenAI-Compatible Provider
//!
//! Talks to any endpoint implementing `POST {base_url}/chat/completions` with
//! `stream: true`. The wire protocol sends one delta per SSE event; the
//! adapter accumulates them so every yielded [`RelayMessage`] carries the
//! complete text generated so far.
//!
//! ## Configuration
//!
//! - `OPENAI_API_BASE_URL`: API base URL (default: `https://api.openai.com/v1`)
//! - `OPENAI_API_KEY`: bearer key, omitted from the request when unset
//! - `OPENAI_API_MODEL`: model name (default: `gpt-3.5-turbo`)
//! - `TIMEOUT_MS`: whole-request timeout (default: 100000)

use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use relay_core::constants::llm::{CONNECT_TIMEOUT_SECS, PROVIDER_NAME};
use relay_core::errors::{AppError, AppResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::sse_parser::{sse_events, SseEvent};
use super::{
    CompletionRequest, LlmProvider, MessageRole, MessageStream, ProviderSummary, RelayMessage,
};
use crate::config::LlmConfig;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Cumulative Folding
// ============================================================================

/// Accumulates streamed deltas into the running assistant message
#[derive(Debug)]
pub struct CumulativeFolder {
    message: RelayMessage,
}

impl CumulativeFolder {
    /// Start an empty assistant message answering `parent_message_id`
    #[must_use]
    pub fn new(conversation_id: Option<String>, parent_message_id: String) -> Self {
        Self {
            message: RelayMessage {
                id: Uuid::new_v4().to_string(),
                role: MessageRole::Assistant,
                text: String::new(),
                conversation_id,
                parent_message_id: Some(parent_message_id),
                delta: None,
                detail: None,
            },
        }
    }

    /// Apply one SSE data payload
    ///
    /// Returns the updated cumulative state when the chunk carried text, and
    /// `None` for role-only or empty chunks.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the payload is not a completion chunk or
    /// is an in-band error object
    pub fn apply(&mut self, payload: &str) -> AppResult<Option<RelayMessage>> {
        let raw: serde_json::Value = serde_json::from_str(payload).map_err(|e| {
            AppError::external_service(PROVIDER_NAME, format!("Malformed stream chunk: {e}"))
        })?;

        if let Ok(envelope) = serde_json::from_value::<ErrorEnvelope>(raw.clone()) {
            return Err(AppError::external_service(
                PROVIDER_NAME,
                envelope.error.message,
            ));
        }

        let chunk: StreamChunk = serde_json::from_value(raw.clone()).map_err(|e| {
            AppError::external_service(PROVIDER_NAME, format!("Unexpected stream chunk: {e}"))
        })?;

        let delta: String = chunk
            .choices
            .iter()
            .filter_map(|choice| choice.delta.content.as_deref())
            .collect();
        if delta.is_empty() {
            return Ok(None);
        }

        if let Some(id) = chunk.id {
            self.message.id = id;
        }
        self.message.text.push_str(&delta);
        self.message.delta = Some(delta);
        self.message.detail = Some(raw);
        Ok(Some(self.message.clone()))
    }
}

/// Fold SSE events into cumulative message states
///
/// Ends at `[DONE]` or when the events run out; the first error ends the stream.
pub fn fold_events<S>(events: S, mut folder: CumulativeFolder) -> impl Stream<Item = AppResult<RelayMessage>> + Send
where
    S: Stream<Item = AppResult<SseEvent>> + Send + 'static,
{
    stream! {
        let mut events = Box::pin(events);
        while let Some(event) = events.next().await {
            match event {
                Ok(SseEvent::Data(payload)) => match folder.apply(&payload) {
                    Ok(Some(message)) => yield Ok(message),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                },
                Ok(SseEvent::Done) => return,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Streaming client for an OpenAI-compatible chat completions API
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a provider from the upstream configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: &LlmConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn add_auth_header(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn build_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionBody<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_message.as_deref().filter(|s| !s.is_empty()) {
            messages.push(WireMessage {
                role: MessageRole::System.as_str(),
                content: system,
            });
        }
        messages.push(WireMessage {
            role: MessageRole::User.as_str(),
            content: &request.prompt,
        });

        ChatCompletionBody {
            model: &self.config.model,
            messages,
            stream: true,
            temperature: request.temperature,
            top_p: request.top_p,
        }
    }

    /// Map a non-success HTTP status and body to an upstream error
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
            |_| format!("HTTP {status}"),
            |envelope| match envelope.error.error_type {
                Some(kind) => format!("{kind} - {}", envelope.error.message),
                None => envelope.error.message,
            },
        );

        match status.as_u16() {
            429 => AppError::external_rate_limited(PROVIDER_NAME, detail),
            401 | 403 => AppError::external_service(
                PROVIDER_NAME,
                format!("API authentication failed: {detail}"),
            ),
            502..=504 => AppError::external_unavailable(PROVIDER_NAME, detail),
            _ => AppError::external_service(PROVIDER_NAME, detail),
        }
    }

    fn map_send_error(error: &reqwest::Error) -> AppError {
        if error.is_timeout() || error.is_connect() {
            AppError::external_unavailable(PROVIDER_NAME, format!("Request failed: {error}"))
        } else {
            AppError::external_service(PROVIDER_NAME, format!("Request failed: {error}"))
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    fn config_summary(&self) -> ProviderSummary {
        ProviderSummary {
            provider: PROVIDER_NAME.to_owned(),
            api_model: self.config.model.clone(),
            base_url: self.config.base_url.clone(),
            timeout_ms: self.config.timeout_ms,
        }
    }

    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn complete_stream(&self, request: &CompletionRequest) -> AppResult<MessageStream> {
        let body = self.build_body(request);
        debug!(messages = body.messages.len(), "Starting streaming completion");

        let response = self
            .add_auth_header(self.client.post(self.api_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "Upstream rejected completion request");
            return Err(Self::parse_error_response(status, &text));
        }

        let folder = CumulativeFolder::new(
            request.conversation_id.clone(),
            Uuid::new_v4().to_string(),
        );
        let events = sse_events(response.bytes_stream(), PROVIDER_NAME);
        Ok(Box::pin(fold_events(events, folder)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;
    use relay_core::errors::ErrorCode;
    use std::convert::Infallible;

    fn chunk(id: &str, content: &str) -> String {
        format!(
            "data: {{\"id\":\"{id}\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{content}\"}}}}]}}\n\n"
        )
    }

    async fn fold_bytes(parts: Vec<String>) -> Vec<AppResult<RelayMessage>> {
        let bytes: Vec<Result<Bytes, Infallible>> =
            parts.into_iter().map(|p| Ok(Bytes::from(p))).collect();
        let events = sse_events(stream::iter(bytes), "test");
        let folder = CumulativeFolder::new(Some("c1".to_owned()), "u-1".to_owned());
        fold_events(events, folder).collect().await
    }

    #[tokio::test]
    async fn test_deltas_become_cumulative_text() {
        let messages = fold_bytes(vec![
            "data: {\"id\":\"x\",\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n".to_owned(),
            chunk("x", "H"),
            chunk("x", "e"),
            chunk("x", "llo"),
            "data: [DONE]\n\n".to_owned(),
        ])
        .await;

        let texts: Vec<String> = messages
            .into_iter()
            .map(|m| m.unwrap().text)
            .collect();
        assert_eq!(texts, vec!["H", "He", "Hello"]);
    }

    #[tokio::test]
    async fn test_message_carries_ids_and_detail() {
        let messages = fold_bytes(vec![chunk("chatcmpl-9", "Hi")]).await;
        let message = messages[0].as_ref().unwrap();
        assert_eq!(message.id, "chatcmpl-9");
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.conversation_id.as_deref(), Some("c1"));
        assert_eq!(message.parent_message_id.as_deref(), Some("u-1"));
        assert_eq!(message.delta.as_deref(), Some("Hi"));
        assert!(message.detail.is_some());
    }

    #[tokio::test]
    async fn test_nothing_after_done() {
        let messages = fold_bytes(vec![
            chunk("x", "a"),
            "data: [DONE]\n\n".to_owned(),
            chunk("x", "b"),
        ])
        .await;
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_in_band_error_ends_stream() {
        let messages = fold_bytes(vec![
            chunk("x", "a"),
            "data: {\"error\":{\"message\":\"overloaded\",\"type\":\"server_error\"}}\n\n".to_owned(),
            chunk("x", "b"),
        ])
        .await;
        assert_eq!(messages.len(), 2);
        let error = messages[1].as_ref().unwrap_err();
        assert_eq!(error.code, ErrorCode::ExternalServiceError);
        assert!(error.message.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_error() {
        let messages = fold_bytes(vec!["data: {not json\n\n".to_owned()]).await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_err());
    }

    #[test]
    fn test_parse_error_response_statuses() {
        let body = r#"{"error":{"message":"slow down","type":"rate_limit"}}"#;
        let error = OpenAiCompatibleProvider::parse_error_response(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(error.code, ErrorCode::ExternalRateLimited);
        assert!(error.message.contains("slow down"));

        let error = OpenAiCompatibleProvider::parse_error_response(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(error.code, ErrorCode::ExternalServiceUnavailable);

        let error = OpenAiCompatibleProvider::parse_error_response(StatusCode::UNAUTHORIZED, body);
        assert_eq!(error.code, ErrorCode::ExternalServiceError);
        assert!(error.message.contains("authentication"));
    }

    #[test]
    fn test_request_body_shape() {
        let config = LlmConfig {
            base_url: "http://localhost:9/v1/".to_owned(),
            api_key: None,
            model: "gpt-test".to_owned(),
            timeout_ms: 1_000,
        };
        let provider = OpenAiCompatibleProvider::new(&config).unwrap();
        assert_eq!(provider.api_url(), "http://localhost:9/v1/chat/completions");

        let request = CompletionRequest {
            prompt: "hello".to_owned(),
            system_message: Some("be brief".to_owned()),
            temperature: Some(0.5),
            ..CompletionRequest::default()
        };
        let body = serde_json::to_value(provider.build_body(&request)).unwrap();
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["temperature"], 0.5);
        assert!(body.get("top_p").is_none());
    }
}
