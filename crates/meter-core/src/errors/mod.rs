// ABOUTME: Unified error handling with run-scoped error codes and domain-specific errors
// ABOUTME: Defines AppError for fatal run faults plus extraction and store error types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unified Error Handling System
//!
//! Errors are split by scope:
//!
//! - [`AppError`] carries run-scoped faults (configuration, account selection)
//!   that terminate a crawl run and surface to the trigger.
//! - [`ExtractError`] and [`StoreError`] are account-scoped: they are captured in
//!   per-account results and never abort sibling accounts.

/// HTML credit extraction failures
pub mod extract;

/// Record store failures
pub mod store;

pub use extract::ExtractError;
pub use store::{StoreError, StoreOperation};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes for run-scoped faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Configuration (6000-6999)
    /// A required setting or secret is absent
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,
    /// A setting is present but unusable
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Record store (7000-7999)
    /// Choosing the due accounts failed
    #[serde(rename = "SELECTION_FAILED")]
    SelectionFailed = 7000,
    /// The store could not be opened or prepared
    #[serde(rename = "STORE_UNAVAILABLE")]
    StoreUnavailable = 7001,

    // Internal Errors (9000-9999)
    /// Anything else
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::SelectionFailed => "Selecting due accounts failed",
            Self::StoreUnavailable => "Record store is unavailable",
            Self::InternalError => "An internal error occurred",
        }
    }

    /// Whether this fault happens before any crawl work starts
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigMissing | Self::ConfigInvalid)
    }
}

/// Unified error type for run-scoped faults
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Required setting is missing
    pub fn config_missing(name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissing,
            format!("{} must be set", name.into()),
        )
    }

    /// Setting is present but invalid
    pub fn config_invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigInvalid,
            format!("{}: {}", name.into(), reason.into()),
        )
    }

    /// Account selection failed; the run cannot proceed
    #[must_use]
    pub fn selection(error: StoreError) -> Self {
        Self::new(ErrorCode::SelectionFailed, error.to_string()).with_source(error)
    }

    /// Store could not be opened
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreUnavailable, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
