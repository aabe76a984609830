// ABOUTME: Streaming chat route relaying one prompt to the upstream provider
// ABOUTME: Identity is optional here; anonymous requests stream normally and are not saved
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use relay_core::constants::{routes, streaming};
use relay_core::errors::AppError;
use relay_core::models::User;
use tracing::debug;

use super::json_body;
use crate::auth::bearer_token;
use crate::relay::ChatProcessRequest;
use crate::resources::ServerResources;

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create the streaming relay route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(routes::CHAT_PROCESS, post(Self::chat_process))
            .with_state(resources)
    }

    /// Resolve the caller if a usable token was sent
    ///
    /// Any failure, including a storage error during lookup, leaves the
    /// request anonymous.
    async fn optional_user(headers: &HeaderMap, resources: &ServerResources) -> Option<User> {
        let token = bearer_token(headers)?;
        match resources.auth.verify_token(token).await {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(code = ?e.code, "Proceeding without identity");
                None
            }
        }
    }

    /// Stream upstream message states as newline-separated JSON frames
    async fn chat_process(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<ChatProcessRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = json_body(body)?;
        let user = Self::optional_user(&headers, &resources).await;
        let frames = resources.relay.start(request, user)?;

        Ok((
            [(header::CONTENT_TYPE, streaming::CONTENT_TYPE)],
            Body::from_stream(frames),
        )
            .into_response())
    }
}
