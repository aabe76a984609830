// ABOUTME: Database operations for per-user chat history
// ABOUTME: Saves completed turns and lists them by user or conversation with fixed ordering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use relay_core::errors::AppResult;
use relay_core::models::{ChatTurn, NewChatTurn};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::{storage_error, timestamp_now};

/// Create the `chat_history` table and its lookup indexes
pub(super) async fn migrate(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS chat_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            conversation_id TEXT,
            parent_message_id TEXT,
            prompt TEXT NOT NULL,
            response TEXT NOT NULL,
            system_message TEXT,
            temperature REAL,
            top_p REAL,
            created_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| storage_error("create chat_history table", e))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_chat_history_user ON chat_history(user_id, created_at)",
    )
    .execute(pool)
    .await
    .map_err(|e| storage_error("create chat_history user index", e))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_chat_history_conversation ON chat_history(user_id, conversation_id)",
    )
    .execute(pool)
    .await
    .map_err(|e| storage_error("create chat_history conversation index", e))?;

    Ok(())
}

// ============================================================================
// Thread Store
// ============================================================================

/// Conversation history operations
///
/// Every read and delete is scoped by `user_id`. Listing order is part of the
/// contract: the dashboard listing is newest first, conversation replay is
/// oldest first.
#[derive(Clone)]
pub struct ThreadStore {
    pool: SqlitePool,
}

impl ThreadStore {
    /// Create a new thread store over an existing pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one completed turn
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if the owning user does not satisfy the
    /// schema, or a database error if the insert fails
    pub async fn save(&self, turn: NewChatTurn) -> AppResult<ChatTurn> {
        let created_at = timestamp_now();

        let result = sqlx::query(
            r"
            INSERT INTO chat_history (
                user_id, conversation_id, parent_message_id, prompt, response,
                system_message, temperature, top_p, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(turn.user_id)
        .bind(&turn.conversation_id)
        .bind(&turn.parent_message_id)
        .bind(&turn.prompt)
        .bind(&turn.response)
        .bind(&turn.system_message)
        .bind(turn.temperature)
        .bind(turn.top_p)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("save chat", e))?;

        let id = result.last_insert_rowid();
        debug!(chat_id = id, user_id = turn.user_id, "Chat turn saved");

        Ok(ChatTurn {
            id,
            user_id: turn.user_id,
            conversation_id: turn.conversation_id,
            parent_message_id: turn.parent_message_id,
            prompt: turn.prompt,
            response: turn.response,
            system_message: turn.system_message,
            temperature: turn.temperature,
            top_p: turn.top_p,
            created_at,
        })
    }

    /// All turns of a user, most recent first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_history(&self, user_id: i64) -> AppResult<Vec<ChatTurn>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, conversation_id, parent_message_id, prompt, response,
                   system_message, temperature, top_p, created_at
            FROM chat_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("get chat history", e))?;

        Ok(rows.iter().map(row_to_turn).collect())
    }

    /// One conversation of a user, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_by_conversation(
        &self,
        user_id: i64,
        conversation_id: &str,
    ) -> AppResult<Vec<ChatTurn>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, conversation_id, parent_message_id, prompt, response,
                   system_message, temperature, top_p, created_at
            FROM chat_history
            WHERE user_id = $1 AND conversation_id = $2
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id)
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("get conversation", e))?;

        Ok(rows.iter().map(row_to_turn).collect())
    }

    /// Delete one turn owned by the user
    ///
    /// Unknown ids and ids owned by someone else match nothing and succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete statement fails
    pub async fn delete(&self, user_id: i64, chat_id: i64) -> AppResult<()> {
        let result = sqlx::query(
            r"
            DELETE FROM chat_history
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(chat_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("delete chat", e))?;

        debug!(
            chat_id,
            user_id,
            removed = result.rows_affected(),
            "Chat delete processed"
        );
        Ok(())
    }

    /// Delete every turn of one conversation owned by the user
    ///
    /// # Errors
    ///
    /// Returns an error if the delete statement fails
    pub async fn delete_conversation(&self, user_id: i64, conversation_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM chat_history
            WHERE user_id = $1 AND conversation_id = $2
            ",
        )
        .bind(user_id)
        .bind(conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("delete conversation", e))?;

        Ok(result.rows_affected())
    }
}

fn row_to_turn(row: &SqliteRow) -> ChatTurn {
    ChatTurn {
        id: row.get("id"),
        user_id: row.get("user_id"),
        conversation_id: row.get("conversation_id"),
        parent_message_id: row.get("parent_message_id"),
        prompt: row.get("prompt"),
        response: row.get("response"),
        system_message: row.get("system_message"),
        temperature: row.get("temperature"),
        top_p: row.get("top_p"),
        created_at: row.get("created_at"),
    }
}
