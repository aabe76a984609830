// ABOUTME: Uniform {status, message, data} response body for non-streaming endpoints
// ABOUTME: Success and Fail constructors plus axum IntoResponse under http-response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Outcome marker carried in every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeStatus {
    /// Operation succeeded
    Success,
    /// Operation failed; `message` explains why
    Fail,
}

/// Response body shared by every JSON endpoint
///
/// `data` is always present on the wire and is `null` when there is no payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Success or Fail
    pub status: EnvelopeStatus,
    /// Human-readable outcome
    pub message: String,
    /// Payload, or null
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful outcome with a payload
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Successful outcome without a payload
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
            data: None,
        }
    }

    /// Failed outcome; data is always null
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Fail,
            message: message.into(),
            data: None,
        }
    }

    /// Whether this envelope reports success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}

#[cfg(feature = "http-response")]
impl<T: Serialize> axum::response::IntoResponse for Envelope<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}
