// ABOUTME: User management database operations
// ABOUTME: Handles user creation and lookup by id, username, or email
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use relay_core::errors::AppResult;
use relay_core::models::User;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{storage_error, timestamp_now};

/// Create the users table
pub(super) async fn migrate(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| storage_error("create users table", e))?;

    Ok(())
}

/// User table operations
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Create a new user store over an existing pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user; the caller has already hashed the password
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if the username or email is taken,
    /// or a database error if the insert fails
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<User> {
        let created_at = timestamp_now();

        let result = sqlx::query(
            r"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("create user", e))?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at,
        })
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("get user", e))?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Get a user by username
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("get user by username", e))?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Whether the username or the email is already registered
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn username_or_email_taken(&self, username: &str, email: &str) -> AppResult<bool> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS taken
            FROM users
            WHERE username = $1 OR email = $2
            ",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("check existing user", e))?;

        Ok(row.get::<i64, _>("taken") > 0)
    }

    /// Number of registered users
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("count users", e))?;
        Ok(row.get("total"))
    }
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}
