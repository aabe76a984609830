// ABOUTME: Database bootstrap, connection pooling, and schema migrations
// ABOUTME: Owns the SQLite pool shared by user storage and conversation history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! A single [`Database`] owns the `SQLite` pool. [`UserStore`] and
//! [`ThreadStore`] are cheap handles over the same pool, one per table.

mod chat;
mod users;

pub use chat::ThreadStore;
pub use users::UserStore;

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use relay_core::errors::{AppError, AppResult};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::fs;
use tracing::{debug, info};

use crate::config::DatabaseUrl;

/// Database manager for users and chat history
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool and run migrations
    ///
    /// In-memory databases are pinned to one long-lived connection; every
    /// additional connection would see its own empty database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database directory cannot be created, the
    /// connection fails, or a migration fails
    pub async fn new(url: &DatabaseUrl) -> AppResult<Self> {
        let pool = match url {
            DatabaseUrl::Memory => SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(&url.to_connection_string())
                .await
                .map_err(|e| storage_error("open in-memory database", e))?,
            DatabaseUrl::SQLite { path } => {
                ensure_parent_dir(path).await?;
                // Ensure SQLite creates the database file if it doesn't exist
                let connection = format!("{}?mode=rwc", url.to_connection_string());
                SqlitePool::connect(&connection)
                    .await
                    .map_err(|e| storage_error("open database", e))?
            }
        };

        let db = Self { pool };
        db.migrate().await?;
        info!(database = %url, "Database ready");
        Ok(db)
    }

    /// User table handle
    #[must_use]
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Chat history table handle
    #[must_use]
    pub fn threads(&self) -> ThreadStore {
        ThreadStore::new(self.pool.clone())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub async fn migrate(&self) -> AppResult<()> {
        users::migrate(&self.pool).await?;
        chat::migrate(&self.pool).await?;
        debug!("Migrations applied");
        Ok(())
    }
}

async fn ensure_parent_dir(path: &Path) -> AppResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|e| {
                AppError::database(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            }),
        _ => Ok(()),
    }
}

/// Classify a sqlx failure and prefix it with the attempted action
pub(crate) fn storage_error(action: &str, error: sqlx::Error) -> AppError {
    let base = AppError::from(error);
    AppError {
        message: format!("Failed to {action}: {}", base.message),
        ..base
    }
}

/// Creation timestamp with microsecond precision, so lexical order is
/// chronological order
pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::errors::ErrorCode;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::new(&DatabaseUrl::Memory).await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("relay.db");
        let url = DatabaseUrl::SQLite { path: path.clone() };
        let _db = Database::new(&url).await.unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_storage_error_prefixes_action() {
        let err = storage_error("save chat", sqlx::Error::RowNotFound);
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.starts_with("Failed to save chat: "));
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let first = timestamp_now();
        let second = timestamp_now();
        assert!(first <= second);
        assert!(first.ends_with('Z'));
    }
}
