// ABOUTME: Structured error types for record store operations
// ABOUTME: Captures backend failures and unexpected status codes per store operation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The three store operations the crawler performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOperation {
    /// Query accounts whose staleness marker is old enough
    SelectDue,
    /// Append one reading row
    InsertReading,
    /// Advance an account's staleness marker
    MarkUpdated,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectDue => write!(f, "select due accounts"),
            Self::InsertReading => write!(f, "insert reading"),
            Self::MarkUpdated => write!(f, "advance staleness marker"),
        }
    }
}

/// Record store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend reported an error (connection, SQL, transport)
    #[error("{operation} failed: {message}")]
    Backend {
        /// Operation that failed
        operation: StoreOperation,
        /// Backend error text
        message: String,
    },
    /// The backend answered with a status other than the expected one
    #[error("{operation} returned status {actual}, expected {expected}")]
    UnexpectedStatus {
        /// Operation that failed
        operation: StoreOperation,
        /// Status the contract requires
        expected: u16,
        /// Status actually received
        actual: u16,
    },
    /// A write matched no row
    #[error("{operation} affected no rows for account {account_id}")]
    NoRowsAffected {
        /// Operation that failed
        operation: StoreOperation,
        /// Account the write targeted
        account_id: String,
    },
    /// A returned row could not be decoded
    #[error("{operation} returned a malformed row: {message}")]
    MalformedRow {
        /// Operation that failed
        operation: StoreOperation,
        /// Decoding error text
        message: String,
    },
}

impl StoreError {
    /// Wrap any backend error for the given operation
    pub fn backend(operation: StoreOperation, error: impl fmt::Display) -> Self {
        Self::Backend {
            operation,
            message: error.to_string(),
        }
    }

    /// The operation this error belongs to
    #[must_use]
    pub const fn operation(&self) -> StoreOperation {
        match self {
            Self::Backend { operation, .. }
            | Self::UnexpectedStatus { operation, .. }
            | Self::NoRowsAffected { operation, .. }
            | Self::MalformedRow { operation, .. } => *operation,
        }
    }
}

#[cfg(feature = "database-errors")]
impl From<(StoreOperation, sqlx::Error)> for StoreError {
    fn from((operation, error): (StoreOperation, sqlx::Error)) -> Self {
        Self::backend(operation, error)
    }
}

#[cfg(feature = "http-errors")]
impl From<(StoreOperation, reqwest::Error)> for StoreError {
    fn from((operation, error): (StoreOperation, reqwest::Error)) -> Self {
        match error.status() {
            Some(status) if error.is_status() => Self::Backend {
                operation,
                message: format!("HTTP {status}: {error}"),
            },
            _ => Self::backend(operation, error),
        }
    }
}
