// ABOUTME: Integration tests for batch selection, concurrent crawling, and per-account isolation
// ABOUTME: Covers staleness boundaries, persistence ordering, and an end-to-end run against SQLite
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use async_trait::async_trait;
use common::{
    balance, balance_page, hours_ago, init_test_logging, mount_balance_page, mount_login_success,
    portal_config, FakeStore, ScriptedCrawler,
};
use meter_credit_crawler::crawler::{CrawlPipeline, CreditCrawler};
use meter_credit_crawler::errors::{ErrorCode, ExtractError, StoreOperation};
use meter_credit_crawler::models::{AccountId, AuthFailureReason, CrawlOutcome, Credential, OutcomeKind};
use meter_credit_crawler::orchestrator::{AccountStatus, BatchOrchestrator, SelectionPolicy};
use meter_credit_crawler::store::SqliteStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::MockServer;

fn orchestrator(store: &Arc<FakeStore>, crawler: ScriptedCrawler) -> BatchOrchestrator {
    BatchOrchestrator::new(store.clone(), Arc::new(crawler), SelectionPolicy::default())
}

/// `waiter` only settles once `signaller` has been crawled
#[derive(Default)]
struct RendezvousCrawler {
    signal: Notify,
}

#[async_trait]
impl CreditCrawler for RendezvousCrawler {
    async fn crawl(&self, credential: &Credential) -> CrawlOutcome {
        match credential.account_id.as_str() {
            "waiter" => self.signal.notified().await,
            _ => self.signal.notify_one(),
        }
        CrawlOutcome::Success(balance("1.00"))
    }
}

#[tokio::test]
async fn test_every_failure_stage_is_isolated() {
    init_test_logging();
    let store = Arc::new(FakeStore::default());
    for id in ["ok", "auth", "fetch", "parse", "insert", "mark"] {
        store.add_account(id, None).await;
    }
    store.fail_insert_for("insert").await;
    store.fail_mark_for("mark").await;

    let crawler = ScriptedCrawler::default()
        .with("ok", CrawlOutcome::Success(balance("10.00")))
        .with("auth", CrawlOutcome::AuthFailure(AuthFailureReason::Rejected))
        .with("fetch", CrawlOutcome::FetchFailure("connection reset".to_owned()))
        .with(
            "parse",
            CrawlOutcome::ParseFailure(ExtractError::MissingCurrencySymbol {
                text: "N/A".to_owned(),
            }),
        )
        .with("insert", CrawlOutcome::Success(balance("1.00")))
        .with("mark", CrawlOutcome::Success(balance("2.00")));

    let report = orchestrator(&store, crawler).run().await.unwrap();

    assert_eq!(report.selected(), 6);
    assert_eq!(report.updated(), 1);
    assert_eq!(report.outcomes(OutcomeKind::AuthFailure), 1);
    assert_eq!(report.outcomes(OutcomeKind::FetchFailure), 1);
    assert_eq!(report.outcomes(OutcomeKind::ParseFailure), 1);
    assert_eq!(report.persist_failures(), 2);
    assert_eq!(report.failed().count(), 5);

    let ok = report.account(&AccountId::from("ok")).unwrap();
    assert!(matches!(ok.status, AccountStatus::Updated { .. }));
    assert!(store.last_updated_at("ok").await.is_some());
}

#[tokio::test]
async fn test_failed_insert_leaves_account_due() {
    init_test_logging();
    let store = Arc::new(FakeStore::default());
    store.add_account("m1", Some(hours_ago(48))).await;
    store.fail_insert_for("m1").await;
    let crawler = ScriptedCrawler::default().with("m1", CrawlOutcome::Success(balance("3.30")));

    let report = orchestrator(&store, crawler).run().await.unwrap();

    let status = &report.account(&AccountId::from("m1")).unwrap().status;
    match status {
        AccountStatus::ReadingNotSaved { balance: b, error } => {
            assert_eq!(*b, balance("3.30"));
            assert_eq!(error.operation(), StoreOperation::InsertReading);
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert!(store.readings().await.is_empty());
    assert!(store.last_updated_at("m1").await.unwrap() < hours_ago(47));
}

#[tokio::test]
async fn test_failed_marker_keeps_reading() {
    init_test_logging();
    let store = Arc::new(FakeStore::default());
    store.add_account("m2", None).await;
    store.fail_mark_for("m2").await;
    let crawler = ScriptedCrawler::default().with("m2", CrawlOutcome::Success(balance("8.00")));

    let report = orchestrator(&store, crawler).run().await.unwrap();

    assert_eq!(report.readings_saved(), 1);
    assert!(matches!(
        report.account(&AccountId::from("m2")).unwrap().status,
        AccountStatus::MarkerNotAdvanced { .. }
    ));
    assert_eq!(store.readings().await.len(), 1);
    assert!(store.last_updated_at("m2").await.is_none());

    // Still due, so the next run records a second reading
    let crawler = ScriptedCrawler::default().with("m2", CrawlOutcome::Success(balance("8.00")));
    orchestrator(&store, crawler).run().await.unwrap();
    assert_eq!(store.readings().await.len(), 2);
}

#[tokio::test]
async fn test_selection_failure_aborts_run() {
    init_test_logging();
    let store = Arc::new(FakeStore::default());
    store.add_account("m3", None).await;
    store.fail_select().await;

    let error = orchestrator(&store, ScriptedCrawler::default())
        .run()
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::SelectionFailed);
    assert!(store.readings().await.is_empty());
}

#[tokio::test]
async fn test_staleness_window_boundary() {
    init_test_logging();
    let store = Arc::new(FakeStore::default());
    store.add_account("fresh", Some(hours_ago(23))).await;
    store.add_account("stale", Some(hours_ago(25))).await;
    let crawler = ScriptedCrawler::default()
        .with("fresh", CrawlOutcome::Success(balance("1.00")))
        .with("stale", CrawlOutcome::Success(balance("2.00")));

    let report = orchestrator(&store, crawler).run().await.unwrap();

    assert_eq!(report.selected(), 1);
    assert!(report.account(&AccountId::from("stale")).is_some());
    assert!(report.account(&AccountId::from("fresh")).is_none());
}

#[tokio::test]
async fn test_empty_selection_completes() {
    init_test_logging();
    let store = Arc::new(FakeStore::default());

    let report = orchestrator(&store, ScriptedCrawler::default())
        .run()
        .await
        .unwrap();

    assert_eq!(report.selected(), 0);
    assert!(report.summary().starts_with("0 selected"));
}

#[tokio::test]
async fn test_page_size_limits_selection() {
    init_test_logging();
    let store = Arc::new(FakeStore::default());
    for (id, age) in [("a", 30), ("b", 50), ("c", 40)] {
        store.add_account(id, Some(hours_ago(age))).await;
    }
    let crawler = ScriptedCrawler::default()
        .with("a", CrawlOutcome::Success(balance("1.00")))
        .with("b", CrawlOutcome::Success(balance("1.00")))
        .with("c", CrawlOutcome::Success(balance("1.00")));
    let policy = SelectionPolicy {
        page_size: 2,
        ..SelectionPolicy::default()
    };

    let report = BatchOrchestrator::new(store.clone(), Arc::new(crawler), policy)
        .run()
        .await
        .unwrap();

    let ids: Vec<&str> = report
        .accounts
        .iter()
        .map(|account| account.account_id.as_str())
        .collect();
    assert_eq!(ids, ["b", "c"]);
}

#[tokio::test]
async fn test_end_to_end_against_sqlite_and_mock_portal() {
    init_test_logging();
    let server = MockServer::start().await;
    mount_login_success(&server, "30001").await;
    mount_balance_page(&server, "30001", balance_page("Balance: $10.00")).await;
    mount_login_success(&server, "30002").await;
    mount_balance_page(&server, "30002", balance_page("Balance: $5.50")).await;
    mount_login_success(&server, "30003").await;
    mount_balance_page(&server, "30003", balance_page("Balance: unavailable")).await;

    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    store
        .register_account(&Credential::new("30001", "pw"), None)
        .await
        .unwrap();
    store
        .register_account(&Credential::new("30002", "pw"), Some(hours_ago(25)))
        .await
        .unwrap();
    store
        .register_account(&Credential::new("30003", "pw"), Some(hours_ago(30)))
        .await
        .unwrap();

    let pipeline = CrawlPipeline::from_config(&portal_config(&server)).unwrap();
    let orchestrator = BatchOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(pipeline),
        SelectionPolicy::default(),
    );

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.selected(), 3);
    assert_eq!(report.updated(), 2);
    assert_eq!(report.outcomes(OutcomeKind::ParseFailure), 1);
    assert_eq!(store.reading_count().await.unwrap(), 2);

    let first = store.readings_for(&AccountId::from("30001")).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].balance, balance("10.00"));
    let second = store.readings_for(&AccountId::from("30002")).await.unwrap();
    assert_eq!(second[0].balance, balance("5.50"));

    for id in ["30001", "30002"] {
        let marker = store
            .last_updated_at(&AccountId::from(id))
            .await
            .unwrap()
            .unwrap();
        assert!(marker > hours_ago(1));
    }
    let untouched = store
        .last_updated_at(&AccountId::from("30003"))
        .await
        .unwrap()
        .unwrap();
    assert!(untouched < hours_ago(29));

    // Updated accounts are no longer due; the failed one still is
    let rerun = orchestrator.run().await.unwrap();
    assert_eq!(rerun.selected(), 1);
    assert!(rerun.account(&AccountId::from("30003")).is_some());
}

#[tokio::test]
async fn test_stalled_account_does_not_hold_back_others() {
    init_test_logging();
    let store = Arc::new(FakeStore::default());
    // Oldest first, so the stalled account is launched before the one it waits on
    store.add_account("waiter", Some(hours_ago(48))).await;
    store.add_account("signaller", Some(hours_ago(30))).await;

    let orchestrator = BatchOrchestrator::new(
        store.clone(),
        Arc::new(RendezvousCrawler::default()),
        SelectionPolicy::default(),
    );
    let report = tokio::time::timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("accounts must be crawled concurrently")
        .unwrap();

    assert_eq!(report.selected(), 2);
    assert_eq!(report.updated(), 2);
    let waiter = report.account(&AccountId::from("waiter")).unwrap();
    assert!(waiter.status.is_updated());
}

