// ABOUTME: User and chat turn record types for database persistence
// ABOUTME: DTOs for registered users and per-user conversation history rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Database representation of a registered user
///
/// The password hash never leaves the storage layer; handlers expose
/// [`UserSummary`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Generated user ID
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// When the user registered (RFC 3339)
    pub created_at: String,
}

/// Public projection of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID
    pub id: i64,
    /// Login name
    pub username: String,
    /// Email address
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// One persisted prompt/response exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    /// Generated turn ID
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Conversation this turn belongs to, if the client supplied one
    pub conversation_id: Option<String>,
    /// Opaque back-reference to the previous message; never validated
    pub parent_message_id: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Final response text
    pub response: String,
    /// System message sent with the prompt
    pub system_message: Option<String>,
    /// Sampling temperature sent with the prompt
    pub temperature: Option<f64>,
    /// Nucleus sampling value sent with the prompt
    pub top_p: Option<f64>,
    /// When the turn was stored (RFC 3339, microsecond precision)
    pub created_at: String,
}

/// Insert shape for a chat turn
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewChatTurn {
    /// Owning user
    pub user_id: i64,
    /// Conversation ID
    pub conversation_id: Option<String>,
    /// Parent message ID
    pub parent_message_id: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Final response text
    pub response: String,
    /// System message
    pub system_message: Option<String>,
    /// Temperature
    pub temperature: Option<f64>,
    /// Top-p
    pub top_p: Option<f64>,
}
