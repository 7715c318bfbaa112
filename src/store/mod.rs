// ABOUTME: Record store abstraction used by the batch orchestrator
// ABOUTME: SQLite and REST table-API backends behind one async trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Record Store
//!
//! The orchestrator needs exactly three operations from the store: pick due
//! accounts, append a reading, and advance an account's staleness marker. It
//! never creates or deletes accounts.

use crate::errors::StoreError;
use crate::models::{AccountId, AccountRecord, NewReading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod factory;
pub mod rest;
pub mod sqlite;

pub use factory::Store;
pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// Store operations the orchestrator relies on
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Accounts whose `last_updated_at` is at or before `stale_before` (or
    /// absent), oldest first, at most `limit` of them
    async fn due_accounts(
        &self,
        stale_before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<AccountRecord>, StoreError>;

    /// Append one reading row
    async fn insert_reading(&self, reading: &NewReading) -> Result<(), StoreError>;

    /// Set the account's `last_updated_at`
    async fn mark_updated(
        &self,
        account_id: &AccountId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Fixed-width RFC 3339 (microseconds, `Z`) so stored timestamps compare as text
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
