// ABOUTME: Route module organization for the chat relay HTTP endpoints
// ABOUTME: Assembles domain routers, mounts them at the root and under /api, and applies middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the chat relay
//!
//! Each domain module contains route definitions and thin handlers that
//! delegate to [`ServerResources`]. Every non-streaming handler answers with
//! the `{status, message, data}` envelope, including on failure.

/// Registration, login, access secret, session and config routes
pub mod auth;
/// Streaming relay route
pub mod chat;
/// Health check route
pub mod health;
/// Conversation history routes
pub mod history;

pub use auth::AuthRoutes;
pub use chat::ChatRoutes;
pub use health::HealthRoutes;
pub use history::HistoryRoutes;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{middleware as axum_middleware, Json, Router};
use relay_core::constants::routes::API_BASE;
use relay_core::errors::{AppError, AppResult};

use crate::middleware::{request_tracing, setup_cors};
use crate::resources::ServerResources;

/// Build the complete application router
///
/// The same route set answers at `/…` and at `/api/…`.
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(ChatRoutes::routes(Arc::clone(&resources)))
        .merge(HistoryRoutes::routes(Arc::clone(&resources)))
        .merge(HealthRoutes::routes());

    Router::new()
        .merge(api.clone())
        .nest(API_BASE, api)
        .layer(axum_middleware::from_fn(request_tracing))
        .layer(setup_cors(&resources.config.cors))
}

/// Unwrap a JSON body, turning extractor rejections into an envelope error
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::invalid_input(rejection.body_text()))
}
