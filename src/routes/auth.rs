// ABOUTME: Authentication route handlers for registration, login, and the access secret
// ABOUTME: Also serves the session facts and the bearer-protected provider config
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Authentication routes
//!
//! Registration failures answer 400 and login failures 401, each with a Fail
//! envelope. The access-secret check always answers 200 and reports the
//! outcome in the envelope status.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use relay_core::constants::{messages, routes};
use relay_core::envelope::Envelope;
use relay_core::errors::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::json_body;
use crate::auth::AuthSession;
use crate::llm::ProviderSummary;
use crate::resources::ServerResources;
use crate::session::SessionConfig;

// ============================================================================
// Request Types
// ============================================================================

/// Registration payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Login name
    #[serde(default)]
    pub username: String,
    /// Plain password, hashed before storage
    #[serde(default)]
    pub password: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
}

/// Login payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name
    #[serde(default)]
    pub username: String,
    /// Plain password
    #[serde(default)]
    pub password: String,
}

/// Access secret payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Candidate access secret
    #[serde(default)]
    pub token: String,
}

// ============================================================================
// Auth Routes
// ============================================================================

/// Authentication routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(routes::REGISTER, post(Self::register))
            .route(routes::LOGIN, post(Self::login))
            .route(routes::VERIFY, post(Self::verify))
            .route(routes::SESSION, post(Self::session))
            .route(routes::CONFIG, post(Self::config))
            .with_state(resources)
    }

    /// Register a user and return a session
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<RegisterRequest>, JsonRejection>,
    ) -> Result<Json<Envelope<AuthSession>>, AppError> {
        let request = json_body(body)?;
        let session = resources
            .auth
            .register(&request.username, &request.password, &request.email)
            .await?;
        Ok(Json(Envelope::success(
            messages::REGISTRATION_SUCCESSFUL,
            session,
        )))
    }

    /// Exchange credentials for a session
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<LoginRequest>, JsonRejection>,
    ) -> Result<Json<Envelope<AuthSession>>, AppError> {
        let request = json_body(body)?;
        let session = resources
            .auth
            .login(&request.username, &request.password)
            .await?;
        Ok(Json(Envelope::success(messages::LOGIN_SUCCESSFUL, session)))
    }

    /// Check the deployment access secret
    async fn verify(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<VerifyRequest>, JsonRejection>,
    ) -> Response {
        let token = body.map(|Json(request)| request.token).unwrap_or_default();
        match resources.auth.verify_access_secret(&token) {
            Ok(()) => Envelope::<()>::success_empty(messages::VERIFY_SUCCESSFUL).into_response(),
            Err(e) => {
                debug!(code = ?e.code, "Access secret rejected");
                Envelope::<()>::fail(e.client_message()).into_response()
            }
        }
    }

    /// Report static deployment facts
    async fn session(State(resources): State<Arc<ServerResources>>) -> Json<Envelope<SessionConfig>> {
        Json(Envelope::success("", resources.session.clone()))
    }

    /// Report provider configuration to an authenticated caller
    async fn config(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Envelope<ProviderSummary>>, AppError> {
        resources.auth.authenticate(&headers).await?;
        Ok(Json(Envelope::success(
            "",
            resources.provider.config_summary(),
        )))
    }
}
