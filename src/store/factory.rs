// ABOUTME: Store factory selecting the record store backend from configuration
// ABOUTME: Delegates every RecordStore operation to the chosen implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Store factory
//!
//! Picks the backend named by [`StoreConfig`] at startup and hands the
//! orchestrator a single [`Store`] value.

use super::rest::RestStore;
use super::sqlite::SqliteStore;
use super::RecordStore;
use crate::config::StoreConfig;
use crate::errors::{AppResult, StoreError};
use crate::models::{AccountId, AccountRecord, NewReading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

/// Store instance wrapper that delegates to the appropriate implementation
#[derive(Debug, Clone)]
pub enum Store {
    /// `SQLite` backend
    Sqlite(SqliteStore),
    /// Table-API backend
    Rest(RestStore),
}

impl Store {
    /// Open the configured backend
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened or prepared
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        let store = match config {
            StoreConfig::Sqlite { database_url } => {
                Self::Sqlite(SqliteStore::connect(database_url).await?)
            }
            StoreConfig::Rest { base_url, api_key } => {
                Self::Rest(RestStore::new(base_url.clone(), api_key.clone())?)
            }
        };
        info!("Record store: {}", store.backend_info());
        Ok(store)
    }

    /// Get a descriptive string for the current backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "SQLite (local)",
            Self::Rest(_) => "REST table API (hosted)",
        }
    }
}

#[async_trait]
impl RecordStore for Store {
    async fn due_accounts(
        &self,
        stale_before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<AccountRecord>, StoreError> {
        match self {
            Self::Sqlite(store) => store.due_accounts(stale_before, limit).await,
            Self::Rest(store) => store.due_accounts(stale_before, limit).await,
        }
    }

    async fn insert_reading(&self, reading: &NewReading) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(store) => store.insert_reading(reading).await,
            Self::Rest(store) => store.insert_reading(reading).await,
        }
    }

    async fn mark_updated(
        &self,
        account_id: &AccountId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(store) => store.mark_updated(account_id, updated_at).await,
            Self::Rest(store) => store.mark_updated(account_id, updated_at).await,
        }
    }
}
