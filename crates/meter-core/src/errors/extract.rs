// ABOUTME: Error types for extracting a credit balance from portal HTML
// ABOUTME: Distinguishes missing anchors, missing currency symbols, and unparseable amounts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use thiserror::Error;

/// Reasons the balance page could not be turned into a balance.
///
/// The portal's markup is undocumented, so every variant here may also mean the
/// markup drifted rather than the account being broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The configured CSS selector does not parse
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// Selector text as configured
        selector: String,
        /// Parser message
        reason: String,
    },
    /// No element satisfied the anchor strategy
    #[error("balance anchor not found ({anchor})")]
    AnchorNotFound {
        /// Human-readable description of the anchor strategy
        anchor: String,
    },
    /// The anchored element's text has no `$`
    #[error("no currency symbol in `{text}`")]
    MissingCurrencySymbol {
        /// Trimmed element text
        text: String,
    },
    /// The text after `$` is not a decimal number
    #[error("`{segment}` is not a number")]
    NotNumeric {
        /// Trimmed trailing segment
        segment: String,
    },
    /// The amount parsed but is below zero
    #[error("balance {value} is negative")]
    Negative {
        /// Parsed amount
        value: String,
    },
}
