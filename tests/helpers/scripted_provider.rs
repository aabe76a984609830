// ABOUTME: Scripted upstream provider for relay tests
// ABOUTME: Replays fixed cumulative texts, optionally failing at start or mid-stream

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_relay_server::errors::{AppError, AppResult};
use chat_relay_server::llm::{
    CompletionRequest, LlmProvider, MessageRole, MessageStream, ProviderSummary, RelayMessage,
};
use futures_util::stream;

/// One scripted upstream event
#[derive(Debug, Clone)]
pub enum Step {
    /// Emit a message whose cumulative text is the given string
    Text(&'static str),
    /// Fail the stream with the given message
    Fail(&'static str),
}

/// Provider that replays a script instead of calling a real API
pub struct ScriptedProvider {
    steps: Vec<Step>,
    fail_to_start: Option<&'static str>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    /// Replay the given steps
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            fail_to_start: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Emit each text in order, then finish normally
    pub fn texts(texts: &[&'static str]) -> Self {
        Self::new(texts.iter().copied().map(Step::Text).collect())
    }

    /// Reject the request before any message is produced
    pub fn failing_at_start(message: &'static str) -> Self {
        Self {
            fail_to_start: Some(message),
            ..Self::new(Vec::new())
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    fn config_summary(&self) -> ProviderSummary {
        ProviderSummary {
            provider: "scripted".to_owned(),
            api_model: "scripted-model".to_owned(),
            base_url: "memory://".to_owned(),
            timeout_ms: 0,
        }
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> AppResult<MessageStream> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(message) = self.fail_to_start {
            return Err(AppError::external_unavailable("scripted", message));
        }

        let conversation_id = request.conversation_id.clone();
        let items: Vec<AppResult<RelayMessage>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Text(text) => Ok(RelayMessage {
                    id: "msg-1".to_owned(),
                    role: MessageRole::Assistant,
                    text: (*text).to_owned(),
                    conversation_id: conversation_id.clone(),
                    parent_message_id: Some("user-1".to_owned()),
                    delta: None,
                    detail: None,
                }),
                Step::Fail(message) => Err(AppError::external_service("scripted", *message)),
            })
            .collect();

        Ok(Box::pin(stream::iter(items)))
    }
}
