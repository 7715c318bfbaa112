// ABOUTME: Balance value type and the tagged outcome of a single account crawl
// ABOUTME: Every pipeline invocation yields exactly one CrawlOutcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::ExtractError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative prepaid credit amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    /// Wrap an amount; `None` when negative
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero()).then_some(Self(amount))
    }

    /// The amount
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = String;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount).ok_or_else(|| format!("balance {amount} is negative"))
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a login did not yield a usable session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailureReason {
    /// The portal redirected to its invalid-credential page
    Rejected,
    /// Accepted, but no session cookie was issued
    MissingSession,
    /// No response (connection error, deadline expiry)
    Transport(String),
}

impl fmt::Display for AuthFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "credentials rejected"),
            Self::MissingSession => write!(f, "no session cookie issued"),
            Self::Transport(message) => write!(f, "login request failed: {message}"),
        }
    }
}

/// Result of one authenticate → fetch → extract run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Balance harvested
    Success(Balance),
    /// Login failed
    AuthFailure(AuthFailureReason),
    /// Balance page could not be retrieved
    FetchFailure(String),
    /// Balance page could not be interpreted
    ParseFailure(ExtractError),
}

/// Outcome discriminant, for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// `CrawlOutcome::Success`
    Success,
    /// `CrawlOutcome::AuthFailure`
    AuthFailure,
    /// `CrawlOutcome::FetchFailure`
    FetchFailure,
    /// `CrawlOutcome::ParseFailure`
    ParseFailure,
}

impl CrawlOutcome {
    /// The outcome's discriminant
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(_) => OutcomeKind::Success,
            Self::AuthFailure(_) => OutcomeKind::AuthFailure,
            Self::FetchFailure(_) => OutcomeKind::FetchFailure,
            Self::ParseFailure(_) => OutcomeKind::ParseFailure,
        }
    }

    /// The balance, when the crawl succeeded
    #[must_use]
    pub const fn balance(&self) -> Option<Balance> {
        match self {
            Self::Success(balance) => Some(*balance),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(balance) => write!(f, "balance ${balance}"),
            Self::AuthFailure(reason) => write!(f, "auth failure: {reason}"),
            Self::FetchFailure(message) => write!(f, "fetch failure: {message}"),
            Self::ParseFailure(error) => write!(f, "parse failure: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_rejects_negative_amounts() {
        assert!(Balance::new(Decimal::new(-1, 2)).is_none());
        assert!(Balance::new(Decimal::ZERO).is_some());
        assert_eq!(
            Balance::new(Decimal::new(1250, 2)).map(|b| b.amount()),
            Some(Decimal::new(125, 1))
        );
    }

    #[test]
    fn test_outcome_kind() {
        let outcome = CrawlOutcome::AuthFailure(AuthFailureReason::Rejected);
        assert_eq!(outcome.kind(), OutcomeKind::AuthFailure);
        assert!(outcome.balance().is_none());
    }
}
