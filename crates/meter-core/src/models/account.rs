// ABOUTME: Account, credential, and reading models shared between store and crawler
// ABOUTME: Credential secrets are redacted from Debug output and zeroed on drop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::Balance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Opaque portal account identifier (the meter id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Portal password. Never printed, zeroed when dropped.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret for the one place that must send it
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Login credential for one portal account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Portal login id
    pub account_id: AccountId,
    /// Portal password
    pub secret: Secret,
}

impl Credential {
    /// Build a credential
    pub fn new(account_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account_id: AccountId::new(account_id),
            secret: Secret::new(secret),
        }
    }
}

/// An account row as returned by the record store
#[derive(Debug, Clone)]
pub struct AccountRecord {
    /// Login credential (its id is the account id)
    pub credential: Credential,
    /// When a balance was last recorded; `None` if never
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    /// Account identifier
    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.credential.account_id
    }
}

/// A reading row to append after a successful crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReading {
    /// Account the balance belongs to
    pub account_id: AccountId,
    /// Harvested balance
    pub balance: Balance,
    /// When the balance was harvested
    pub recorded_at: DateTime<Utc>,
}
