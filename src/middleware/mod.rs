// ABOUTME: HTTP middleware for the relay router
// ABOUTME: CORS layer setup and per-request tracing spans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// CORS configuration
pub mod cors;
/// Request ID and span middleware
pub mod tracing;

pub use cors::setup_cors;
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};
