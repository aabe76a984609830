// ABOUTME: Core types and constants for the chat relay server
// ABOUTME: Foundation crate with error handling, response envelope, models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Relay Core
//!
//! Foundation crate providing shared types and constants for the chat relay
//! server. This crate is designed to change infrequently, enabling incremental
//! compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ErrorKind`
//! - **envelope**: The `{status, message, data}` body shared by every JSON endpoint
//! - **models**: Users and persisted chat turns
//! - **constants**: Application-wide constants organized by domain

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Uniform success/failure response body
pub mod envelope;

/// Core data models (User, `ChatTurn`)
pub mod models;

/// Application constants organized by domain
pub mod constants;
