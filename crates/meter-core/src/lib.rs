// ABOUTME: Core types and constants for the prepaid meter credit crawler
// ABOUTME: Foundation crate with error handling, crawl data models, and portal constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Meter Core
//!
//! Foundation crate providing shared types and constants for the meter credit
//! crawler. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and domain-specific errors
//! - **constants**: Portal form fields, endpoints, and selection defaults
//! - **models**: Credentials, session tokens, balances, and crawl outcomes

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (Credential, `SessionToken`, Balance, `CrawlOutcome`, etc.)
pub mod models;
