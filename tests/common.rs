// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging setup, a scripted crawler, an in-memory store, and a mock portal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs
)]
//! Shared test utilities for `meter_credit_crawler`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meter_credit_crawler::config::PortalConfig;
use meter_credit_crawler::crawler::CreditCrawler;
use meter_credit_crawler::errors::{StoreError, StoreOperation};
use meter_credit_crawler::models::{
    AccountId, AccountRecord, Balance, Credential, CrawlOutcome, NewReading,
};
use meter_credit_crawler::store::RecordStore;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Once;
use std::time::Duration;
use tokio::sync::Mutex;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once at start of each test)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

pub fn balance(raw: &str) -> Balance {
    Balance::new(Decimal::from_str(raw).unwrap()).unwrap()
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::hours(hours)
}

/// Balance page with the amount in the fourth `.mainContent_normalText` cell
pub fn balance_page(amount_text: &str) -> String {
    format!(
        r#"<html><body><table>
            <tr><td class="mainContent_normalText">Meter ID</td></tr>
            <tr><td class="mainContent_normalText">10001234</td></tr>
            <tr><td class="mainContent_normalText">Status: Active</td></tr>
            <tr><td class="mainContent_normalText">{amount_text}</td></tr>
        </table></body></html>"#
    )
}

/// Portal settings pointed at a mock server, with short deadlines
pub fn portal_config(server: &MockServer) -> PortalConfig {
    let mut config = PortalConfig::with_base_url(&format!("{}/EVSEntApp-war", server.uri())).unwrap();
    config.request_timeout = Duration::from_secs(2);
    config.connect_timeout = Duration::from_secs(1);
    config
}

/// Accept `account_id` and hand out a session cookie tied to it
pub async fn mount_login_success(server: &MockServer, account_id: &str) {
    Mock::given(method("POST"))
        .and(path("/EVSEntApp-war/loginServlet"))
        .and(body_string_contains(format!("txtLoginId={account_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", format!("JSESSIONID=s-{account_id}; Path=/EVSEntApp-war; HttpOnly"))
                .set_body_string("<html>Welcome</html>"),
        )
        .mount(server)
        .await;
}

/// Reject `account_id` the way the portal does: redirect to an error page
pub async fn mount_login_rejected(server: &MockServer, account_id: &str) {
    Mock::given(method("POST"))
        .and(path("/EVSEntApp-war/loginServlet"))
        .and(body_string_contains(format!("txtLoginId={account_id}")))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/EVSEntApp-war/loginInvalid.jsp"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/EVSEntApp-war/loginInvalid.jsp"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Invalid login</html>"))
        .mount(server)
        .await;
}

/// Serve `body` as the balance page for the session issued to `account_id`
pub async fn mount_balance_page(server: &MockServer, account_id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/EVSEntApp-war/viewMeterCreditServlet"))
        .and(header("cookie", format!("JSESSIONID=s-{account_id}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Crawler that returns a fixed outcome per account
#[derive(Default)]
pub struct ScriptedCrawler {
    outcomes: HashMap<String, CrawlOutcome>,
}

impl ScriptedCrawler {
    pub fn with(mut self, account_id: &str, outcome: CrawlOutcome) -> Self {
        self.outcomes.insert(account_id.to_owned(), outcome);
        self
    }
}

#[async_trait]
impl CreditCrawler for ScriptedCrawler {
    async fn crawl(&self, credential: &Credential) -> CrawlOutcome {
        // Yield so accounts interleave like real network calls would
        tokio::task::yield_now().await;
        self.outcomes
            .get(credential.account_id.as_str())
            .cloned()
            .unwrap_or_else(|| CrawlOutcome::FetchFailure("no script for account".to_owned()))
    }
}

#[derive(Default)]
struct FakeState {
    accounts: Vec<AccountRecord>,
    readings: Vec<NewReading>,
    fail_select: bool,
    fail_insert: HashSet<String>,
    fail_mark: HashSet<String>,
}

/// In-memory record store with failure injection
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<FakeState>,
}

impl FakeStore {
    pub async fn add_account(&self, account_id: &str, last_updated_at: Option<DateTime<Utc>>) {
        self.state.lock().await.accounts.push(AccountRecord {
            credential: Credential::new(account_id, format!("pw-{account_id}")),
            last_updated_at,
        });
    }

    pub async fn fail_select(&self) {
        self.state.lock().await.fail_select = true;
    }

    pub async fn fail_insert_for(&self, account_id: &str) {
        self.state.lock().await.fail_insert.insert(account_id.to_owned());
    }

    pub async fn fail_mark_for(&self, account_id: &str) {
        self.state.lock().await.fail_mark.insert(account_id.to_owned());
    }

    pub async fn readings(&self) -> Vec<NewReading> {
        self.state.lock().await.readings.clone()
    }

    pub async fn last_updated_at(&self, account_id: &str) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .await
            .accounts
            .iter()
            .find(|account| account.account_id().as_str() == account_id)
            .and_then(|account| account.last_updated_at)
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn due_accounts(
        &self,
        stale_before: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<AccountRecord>, StoreError> {
        let state = self.state.lock().await;
        if state.fail_select {
            return Err(StoreError::UnexpectedStatus {
                operation: StoreOperation::SelectDue,
                expected: 200,
                actual: 503,
            });
        }

        let mut due: Vec<AccountRecord> = state
            .accounts
            .iter()
            .filter(|account| account.last_updated_at.map_or(true, |at| at <= stale_before))
            .cloned()
            .collect();
        due.sort_by_key(|account| account.last_updated_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn insert_reading(&self, reading: &NewReading) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_insert.contains(reading.account_id.as_str()) {
            return Err(StoreError::UnexpectedStatus {
                operation: StoreOperation::InsertReading,
                expected: 201,
                actual: 500,
            });
        }
        state.readings.push(reading.clone());
        Ok(())
    }

    async fn mark_updated(
        &self,
        account_id: &AccountId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_mark.contains(account_id.as_str()) {
            return Err(StoreError::UnexpectedStatus {
                operation: StoreOperation::MarkUpdated,
                expected: 204,
                actual: 500,
            });
        }
        let account = state
            .accounts
            .iter_mut()
            .find(|account| account.account_id() == account_id)
            .ok_or_else(|| StoreError::NoRowsAffected {
                operation: StoreOperation::MarkUpdated,
                account_id: account_id.to_string(),
            })?;
        account.last_updated_at = Some(updated_at);
        Ok(())
    }
}
