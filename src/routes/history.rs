// ABOUTME: Conversation history route handlers, all requiring a session token
// ABOUTME: Lists, replays, and deletes the caller's own chat turns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! History routes
//!
//! `/chat-history/:id` is a single path segment shared by two operations: `GET`
//! treats it as a conversation ID, `DELETE` as a numeric chat ID. A chat ID
//! that is not a number matches nothing and the delete still succeeds.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get},
    Json, Router,
};
use relay_core::constants::{messages, routes};
use relay_core::envelope::Envelope;
use relay_core::errors::AppError;
use relay_core::models::ChatTurn;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::resources::ServerResources;

/// Outcome of a conversation delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCount {
    /// Number of turns removed
    pub deleted: u64,
}

/// History routes handler
pub struct HistoryRoutes;

impl HistoryRoutes {
    /// Create all history routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(routes::CHAT_HISTORY, get(Self::list_history))
            .route(
                routes::CHAT_HISTORY_ITEM,
                get(Self::get_conversation).delete(Self::delete_chat),
            )
            .route(routes::CONVERSATION, delete(Self::delete_conversation))
            .with_state(resources)
    }

    /// Every turn of the caller, most recent first
    async fn list_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Envelope<Vec<ChatTurn>>>, AppError> {
        let user = resources.auth.authenticate(&headers).await?;
        let turns = resources.threads.get_history(user.id).await?;
        debug!(user_id = user.id, count = turns.len(), "History listed");
        Ok(Json(Envelope::success("", turns)))
    }

    /// One conversation of the caller, oldest first
    async fn get_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Json<Envelope<Vec<ChatTurn>>>, AppError> {
        let user = resources.auth.authenticate(&headers).await?;
        let turns = resources
            .threads
            .get_by_conversation(user.id, &conversation_id)
            .await?;
        Ok(Json(Envelope::success("", turns)))
    }

    /// Delete one turn if the caller owns it
    async fn delete_chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(chat_id): Path<String>,
    ) -> Result<Json<Envelope<()>>, AppError> {
        let user = resources.auth.authenticate(&headers).await?;
        match chat_id.parse::<i64>() {
            Ok(chat_id) => resources.threads.delete(user.id, chat_id).await?,
            Err(_) => debug!(chat_id = %chat_id, "Non-numeric chat id matches nothing"),
        }
        Ok(Json(Envelope::success_empty(messages::CHAT_DELETED)))
    }

    /// Delete every turn of one of the caller's conversations
    async fn delete_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Json<Envelope<DeletedCount>>, AppError> {
        let user = resources.auth.authenticate(&headers).await?;
        let deleted = resources
            .threads
            .delete_conversation(user.id, &conversation_id)
            .await?;
        info!(user_id = user.id, deleted, "Conversation deleted");
        Ok(Json(Envelope::success(
            messages::CONVERSATION_DELETED,
            DeletedCount { deleted },
        )))
    }
}
