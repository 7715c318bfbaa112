// ABOUTME: Batch orchestrator selecting due accounts and crawling them concurrently
// ABOUTME: Persists successes, isolates per-account failures, and returns a run report
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Batch Orchestrator
//!
//! One run selects the accounts whose staleness marker is old enough, crawls
//! all of them concurrently on the calling task, and settles each one
//! independently. Only selection failures abort a run; everything that goes
//! wrong for a single account ends up in that account's [`AccountReport`].

use crate::config::SelectionConfig;
use crate::crawler::CreditCrawler;
use crate::errors::{AppError, AppResult, StoreError};
use crate::logging::CrawlLogger;
use crate::models::{AccountId, AccountRecord, Balance, CrawlOutcome, NewReading, OutcomeKind};
use crate::store::RecordStore;
use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Which accounts a run picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Maximum accounts per run
    pub page_size: u32,
    /// Minimum age of `last_updated_at`
    pub staleness_window: Duration,
}

impl SelectionPolicy {
    /// Latest `last_updated_at` that still counts as due at `now`
    ///
    /// Saturates at the earliest representable instant, so only never-crawled
    /// accounts are due under a window reaching past it.
    #[must_use]
    pub fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.staleness_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether an account with this marker is due at `now`
    #[must_use]
    pub fn is_due(&self, last_updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_updated_at {
            Some(at) => at <= self.stale_before(now),
            None => true,
        }
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionConfig::default().into()
    }
}

impl From<SelectionConfig> for SelectionPolicy {
    fn from(config: SelectionConfig) -> Self {
        Self {
            page_size: config.page_size,
            staleness_window: Duration::hours(i64::from(config.staleness_hours)),
        }
    }
}

/// How one account settled
#[derive(Debug)]
pub enum AccountStatus {
    /// Reading stored and marker advanced
    Updated {
        /// Recorded balance
        balance: Balance,
    },
    /// Authentication, fetch, or extraction failed; nothing written
    CrawlFailed(CrawlOutcome),
    /// Crawl succeeded but the reading insert failed; marker untouched
    ReadingNotSaved {
        /// Harvested balance
        balance: Balance,
        /// Insert failure
        error: StoreError,
    },
    /// Reading stored but the marker advance failed
    MarkerNotAdvanced {
        /// Recorded balance
        balance: Balance,
        /// Update failure
        error: StoreError,
    },
}

impl AccountStatus {
    /// Whether the account reached its goal state
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }

    /// Whether a reading row was written
    #[must_use]
    pub const fn reading_saved(&self) -> bool {
        matches!(
            self,
            Self::Updated { .. } | Self::MarkerNotAdvanced { .. }
        )
    }

    /// Balance harvested by the crawl, if any
    #[must_use]
    pub const fn balance(&self) -> Option<Balance> {
        match self {
            Self::Updated { balance }
            | Self::ReadingNotSaved { balance, .. }
            | Self::MarkerNotAdvanced { balance, .. } => Some(*balance),
            Self::CrawlFailed(_) => None,
        }
    }

    /// Kind of the crawl outcome that led here
    #[must_use]
    pub const fn outcome_kind(&self) -> OutcomeKind {
        match self {
            Self::CrawlFailed(outcome) => outcome.kind(),
            _ => OutcomeKind::Success,
        }
    }
}

/// Result for one selected account
#[derive(Debug)]
pub struct AccountReport {
    /// Account identifier
    pub account_id: AccountId,
    /// Settled state
    pub status: AccountStatus,
}

/// Summary of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// When selection started
    pub started_at: DateTime<Utc>,
    /// Wall time from start until every account settled
    pub elapsed: std::time::Duration,
    /// One entry per selected account, in selection order
    pub accounts: Vec<AccountReport>,
}

impl RunReport {
    /// Accounts selected
    #[must_use]
    pub fn selected(&self) -> usize {
        self.accounts.len()
    }

    /// Accounts with a stored reading and advanced marker
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(AccountStatus::is_updated)
    }

    /// Reading rows written this run
    #[must_use]
    pub fn readings_saved(&self) -> usize {
        self.count(AccountStatus::reading_saved)
    }

    /// Accounts whose crawl ended with the given outcome kind
    #[must_use]
    pub fn outcomes(&self, kind: OutcomeKind) -> usize {
        self.count(|status| status.outcome_kind() == kind)
    }

    /// Accounts whose crawl succeeded but whose write failed
    #[must_use]
    pub fn persist_failures(&self) -> usize {
        self.count(|status| {
            matches!(
                status,
                AccountStatus::ReadingNotSaved { .. } | AccountStatus::MarkerNotAdvanced { .. }
            )
        })
    }

    /// Accounts that did not reach the updated state
    pub fn failed(&self) -> impl Iterator<Item = &AccountReport> {
        self.accounts.iter().filter(|report| !report.status.is_updated())
    }

    /// Report for one account
    #[must_use]
    pub fn account(&self, account_id: &AccountId) -> Option<&AccountReport> {
        self.accounts
            .iter()
            .find(|report| &report.account_id == account_id)
    }

    /// One-line run summary
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }

    fn count(&self, predicate: impl Fn(&AccountStatus) -> bool) -> usize {
        self.accounts
            .iter()
            .filter(|report| predicate(&report.status))
            .count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} selected, {} updated, {} auth failures, {} fetch failures, {} parse failures, {} persist failures in {:.1}s",
            self.selected(),
            self.updated(),
            self.outcomes(OutcomeKind::AuthFailure),
            self.outcomes(OutcomeKind::FetchFailure),
            self.outcomes(OutcomeKind::ParseFailure),
            self.persist_failures(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Runs crawl batches against a record store
#[derive(Clone)]
pub struct BatchOrchestrator {
    store: Arc<dyn RecordStore>,
    crawler: Arc<dyn CreditCrawler>,
    policy: SelectionPolicy,
}

impl BatchOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        crawler: Arc<dyn CreditCrawler>,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            store,
            crawler,
            policy,
        }
    }

    /// The selection policy in effect
    #[must_use]
    pub const fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Run one batch.
    ///
    /// Every selected account is crawled concurrently; the call returns once
    /// all of them have settled.
    ///
    /// # Errors
    ///
    /// Returns a selection fault if the due accounts cannot be read. Nothing
    /// that happens to an individual account is an error here.
    pub async fn run(&self) -> AppResult<RunReport> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let stale_before = self.policy.stale_before(started_at);

        info!(
            run.page_size = self.policy.page_size,
            run.stale_before = %stale_before,
            "Starting meter credit crawl"
        );

        let due = self
            .store
            .due_accounts(stale_before, self.policy.page_size)
            .await
            .map_err(AppError::selection)?;
        info!(run.selected = due.len(), "Selected due accounts");

        let accounts = join_all(due.into_iter().map(|account| {
            let span = info_span!("account", account.id = %account.account_id());
            self.process_account(account).instrument(span)
        }))
        .await;

        let report = RunReport {
            started_at,
            elapsed: timer.elapsed(),
            accounts,
        };
        info!(
            run.elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Meter credit crawl complete: {report}"
        );
        Ok(report)
    }

    /// Crawl one account and persist the outcome: insert, then advance
    async fn process_account(&self, account: AccountRecord) -> AccountReport {
        let account_id = account.account_id().clone();
        let outcome = self.crawler.crawl(&account.credential).await;

        let status = match outcome {
            CrawlOutcome::Success(balance) => self.persist(&account_id, balance).await,
            failure => AccountStatus::CrawlFailed(failure),
        };

        let report = AccountReport { account_id, status };
        CrawlLogger::log_account_report(&report);
        report
    }

    async fn persist(&self, account_id: &AccountId, balance: Balance) -> AccountStatus {
        let recorded_at = Utc::now();
        let reading = NewReading {
            account_id: account_id.clone(),
            balance,
            recorded_at,
        };

        if let Err(error) = self.store.insert_reading(&reading).await {
            return AccountStatus::ReadingNotSaved { balance, error };
        }

        match self.store.mark_updated(account_id, recorded_at).await {
            Ok(()) => AccountStatus::Updated { balance },
            Err(error) => AccountStatus::MarkerNotAdvanced { balance, error },
        }
    }
}
