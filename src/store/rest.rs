// ABOUTME: Record store backed by a hosted PostgREST-style table API
// ABOUTME: Each operation is one HTTP call and must answer with its documented status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{format_timestamp, RecordStore};
use crate::constants::tables;
use crate::errors::{AppError, AppResult, StoreError, StoreOperation};
use crate::models::{AccountId, AccountRecord, Balance, Credential, NewReading, Secret};
use crate::utils::http_client::store_client;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

const API_KEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";

#[derive(Debug, Deserialize)]
struct MeterRow {
    #[serde(rename = "meterId")]
    meter_id: String,
    password: Secret,
    #[serde(rename = "readingUpdatedAt", default)]
    reading_updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReadingRow<'a> {
    #[serde(rename = "meterId")]
    meter_id: &'a AccountId,
    reading: Balance,
}

#[derive(Debug, Serialize)]
struct MarkerPatch {
    #[serde(rename = "readingUpdatedAt")]
    reading_updated_at: String,
}

/// Table-API record store
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: Url,
    api_key: Secret,
}

impl RestStore {
    /// Create a store client for the given project root
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: Url, api_key: Secret) -> AppResult<Self> {
        let client = store_client()
            .map_err(|e| AppError::store_unavailable(format!("Failed to build store client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn table_url(&self, table: &str, operation: StoreOperation) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| StoreError::backend(operation, e))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, self.api_key.expose())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose()))
    }

    async fn send(
        request: RequestBuilder,
        operation: StoreOperation,
        expected: StatusCode,
    ) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::from((operation, e)))?;

        let actual = response.status();
        if actual != expected {
            warn!(
                store.operation = %operation,
                http.status = %actual,
                "Record store answered with an unexpected status"
            );
            return Err(StoreError::UnexpectedStatus {
                operation,
                expected: expected.as_u16(),
                actual: actual.as_u16(),
            });
        }
        Ok(response)
    }
}

/// Accept both `timestamptz` and zone-less `timestamp` renderings
fn parse_marker(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn record_from_row(row: MeterRow) -> AccountRecord {
    let last_updated_at = row.reading_updated_at.as_deref().and_then(|raw| {
        let parsed = parse_marker(raw);
        if parsed.is_none() {
            warn!(account.id = %row.meter_id, marker = %raw, "Unreadable staleness marker; treating account as due");
        }
        parsed
    });

    AccountRecord {
        credential: Credential {
            account_id: AccountId::new(row.meter_id),
            secret: row.password,
        },
        last_updated_at,
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn due_accounts(
        &self,
        stale_before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<AccountRecord>, StoreError> {
        let operation = StoreOperation::SelectDue;
        let url = self.table_url(tables::REST_ACCOUNTS, operation)?;
        let filter = format!(
            "(readingUpdatedAt.is.null,readingUpdatedAt.lte.{})",
            format_timestamp(stale_before)
        );
        let request = self.authorized(self.client.get(url)).query(&[
            ("select", "*".to_owned()),
            ("or", filter),
            ("order", "readingUpdatedAt.asc.nullsfirst".to_owned()),
            ("limit", limit.to_string()),
        ]);

        let response = Self::send(request, operation, StatusCode::OK).await?;
        let rows: Vec<MeterRow> = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedRow {
                operation,
                message: e.to_string(),
            })?;

        Ok(rows.into_iter().map(record_from_row).collect())
    }

    async fn insert_reading(&self, reading: &NewReading) -> Result<(), StoreError> {
        let operation = StoreOperation::InsertReading;
        let url = self.table_url(tables::REST_READINGS, operation)?;
        let body = [ReadingRow {
            meter_id: &reading.account_id,
            reading: reading.balance,
        }];
        let request = self
            .authorized(self.client.post(url))
            .header(PREFER_HEADER, "return=minimal")
            .json(&body);

        Self::send(request, operation, StatusCode::CREATED).await?;
        Ok(())
    }

    async fn mark_updated(
        &self,
        account_id: &AccountId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let operation = StoreOperation::MarkUpdated;
        let url = self.table_url(tables::REST_ACCOUNTS, operation)?;
        let request = self
            .authorized(self.client.patch(url))
            .query(&[("meterId", format!("eq.{account_id}"))])
            .header(PREFER_HEADER, "return=minimal")
            .json(&MarkerPatch {
                reading_updated_at: format_timestamp(updated_at),
            });

        Self::send(request, operation, StatusCode::NO_CONTENT).await?;
        Ok(())
    }
}
