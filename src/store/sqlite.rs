// ABOUTME: SQLite record store for local deployments and tests
// ABOUTME: Keeps accounts and appended readings, with text timestamps that sort chronologically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{format_timestamp, RecordStore};
use crate::errors::{AppError, AppResult, StoreError, StoreOperation};
use crate::models::{AccountId, AccountRecord, Balance, Credential, NewReading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{info, warn};

/// A stored reading row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingRow {
    /// Account the reading belongs to
    pub account_id: AccountId,
    /// Recorded balance
    pub balance: Balance,
    /// When it was recorded
    pub recorded_at: DateTime<Utc>,
}

/// `SQLite`-backed record store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the file cannot be opened, or
    /// migrations fail
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::store_unavailable(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if in_memory {
            // Every connection to an in-memory database is a separate database,
            // and closing the last one discards it
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::store_unavailable(format!("Failed to open SQLite store: {e}")))?;

        let store = Self { pool };
        store.migrate().await?;
        info!("SQLite store ready");
        Ok(store)
    }

    /// Get a reference to the pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        let statements = [
            r"
            CREATE TABLE IF NOT EXISTS meters (
                account_id TEXT PRIMARY KEY,
                secret TEXT NOT NULL,
                last_updated_at TEXT,
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_meters_last_updated_at ON meters(last_updated_at)",
            r"
            CREATE TABLE IF NOT EXISTS meter_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id TEXT NOT NULL REFERENCES meters(account_id),
                balance TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_meter_readings_account ON meter_readings(account_id, recorded_at)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::store_unavailable(format!("Migration failed: {e}")))?;
        }
        Ok(())
    }

    /// Add an account, or replace its secret and marker if it exists.
    ///
    /// Administrative; the orchestrator never calls this.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn register_account(
        &self,
        credential: &Credential,
        last_updated_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO meters (account_id, secret, last_updated_at, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(account_id) DO UPDATE SET
                secret = ?2,
                last_updated_at = ?3
            ",
        )
        .bind(credential.account_id.as_str())
        .bind(credential.secret.expose())
        .bind(last_updated_at.map(format_timestamp))
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::store_unavailable(format!("Failed to register account: {e}")))?;
        Ok(())
    }

    /// The account's staleness marker
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn last_updated_at(&self, account_id: &AccountId) -> AppResult<Option<DateTime<Utc>>> {
        let marker: Option<Option<String>> =
            sqlx::query_scalar("SELECT last_updated_at FROM meters WHERE account_id = ?1")
                .bind(account_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::store_unavailable(format!("Failed to read marker: {e}")))?;
        Ok(marker.flatten().as_deref().and_then(parse_timestamp))
    }

    /// All readings for an account, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed
    pub async fn readings_for(&self, account_id: &AccountId) -> AppResult<Vec<ReadingRow>> {
        let rows = sqlx::query(
            r"
            SELECT account_id, balance, recorded_at
            FROM meter_readings
            WHERE account_id = ?1
            ORDER BY recorded_at, id
            ",
        )
        .bind(account_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::store_unavailable(format!("Failed to read readings: {e}")))?;

        rows.iter().map(reading_from_row).collect()
    }

    /// Total number of reading rows
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn reading_count(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM meter_readings")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::store_unavailable(format!("Failed to count readings: {e}")))
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn reading_from_row(row: &SqliteRow) -> AppResult<ReadingRow> {
    let column = |e: sqlx::Error| AppError::internal(format!("Malformed reading row: {e}"));
    let account_id: String = row.try_get("account_id").map_err(column)?;
    let raw_balance: String = row.try_get("balance").map_err(column)?;
    let raw_recorded_at: String = row.try_get("recorded_at").map_err(column)?;

    let balance = Decimal::from_str(&raw_balance)
        .ok()
        .and_then(Balance::new)
        .ok_or_else(|| AppError::internal(format!("Malformed balance `{raw_balance}`")))?;
    let recorded_at = parse_timestamp(&raw_recorded_at)
        .ok_or_else(|| AppError::internal(format!("Malformed timestamp `{raw_recorded_at}`")))?;

    Ok(ReadingRow {
        account_id: AccountId::new(account_id),
        balance,
        recorded_at,
    })
}

fn account_from_row(row: &SqliteRow) -> Result<AccountRecord, StoreError> {
    let malformed = |e: sqlx::Error| StoreError::MalformedRow {
        operation: StoreOperation::SelectDue,
        message: e.to_string(),
    };
    let account_id: String = row.try_get("account_id").map_err(malformed)?;
    let secret: String = row.try_get("secret").map_err(malformed)?;
    let marker: Option<String> = row.try_get("last_updated_at").map_err(malformed)?;

    let last_updated_at = marker.as_deref().and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!(account.id = %account_id, marker = %raw, "Unreadable staleness marker; treating account as due");
        }
        parsed
    });

    Ok(AccountRecord {
        credential: Credential::new(account_id, secret),
        last_updated_at,
    })
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn due_accounts(
        &self,
        stale_before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<AccountRecord>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT account_id, secret, last_updated_at
            FROM meters
            WHERE last_updated_at IS NULL OR last_updated_at <= ?1
            ORDER BY last_updated_at IS NOT NULL, last_updated_at ASC
            LIMIT ?2
            ",
        )
        .bind(format_timestamp(stale_before))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::from((StoreOperation::SelectDue, e)))?;

        rows.iter().map(account_from_row).collect()
    }

    async fn insert_reading(&self, reading: &NewReading) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            INSERT INTO meter_readings (account_id, balance, recorded_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(reading.account_id.as_str())
        .bind(reading.balance.to_string())
        .bind(format_timestamp(reading.recorded_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from((StoreOperation::InsertReading, e)))?;

        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(StoreError::NoRowsAffected {
                operation: StoreOperation::InsertReading,
                account_id: reading.account_id.to_string(),
            })
        }
    }

    async fn mark_updated(
        &self,
        account_id: &AccountId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE meters SET last_updated_at = ?2 WHERE account_id = ?1")
            .bind(account_id.as_str())
            .bind(format_timestamp(updated_at))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from((StoreOperation::MarkUpdated, e)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NoRowsAffected {
                operation: StoreOperation::MarkUpdated,
                account_id: account_id.to_string(),
            });
        }
        Ok(())
    }
}
