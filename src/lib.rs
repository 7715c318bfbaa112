// ABOUTME: Main library entry point for the meter credit crawler
// ABOUTME: Harvests prepaid utility balances from a portal and records them in a store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Meter Credit Crawler
//!
//! Periodically logs into a prepaid-utility web portal on behalf of many
//! accounts, scrapes each account's remaining credit from the balance page,
//! and appends the value to a record store.
//!
//! ## Architecture
//!
//! - **Crawler**: login handshake, balance page fetch, HTML extraction
//! - **Store**: `SQLite` or hosted table API behind one trait
//! - **Orchestrator**: selects due accounts and crawls them concurrently
//! - **Scheduler**: fixed-interval trigger
//! - **Config**: environment-only configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use meter_credit_crawler::config::CrawlerConfig;
//! use meter_credit_crawler::errors::AppResult;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> AppResult<()> {
//!     let config = CrawlerConfig::from_env()?;
//!     let report = meter_credit_crawler::run_once(&config).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

/// Environment configuration
pub mod config;

/// Portal login, fetch, and extraction
pub mod crawler;

/// Structured logging setup and crawl events
pub mod logging;

/// Batch selection, concurrent crawling, and persistence
pub mod orchestrator;

/// Interval trigger
pub mod scheduler;

/// Record store backends
pub mod store;

/// HTTP client helpers
pub mod utils;

/// Error types, re-exported from `meter-core`
pub use meter_core::errors;

/// Constants, re-exported from `meter-core`
pub use meter_core::constants;

/// Domain models, re-exported from `meter-core`
pub use meter_core::models;

use crate::config::CrawlerConfig;
use crate::crawler::CrawlPipeline;
use crate::errors::AppResult;
use crate::orchestrator::{BatchOrchestrator, RunReport};
use crate::store::Store;
use std::sync::Arc;

/// Wire a production orchestrator from configuration
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the portal client cannot
/// be built
pub async fn build_orchestrator(config: &CrawlerConfig) -> AppResult<BatchOrchestrator> {
    let store = Store::connect(&config.store).await?;
    let pipeline = CrawlPipeline::from_config(&config.portal)?;
    Ok(BatchOrchestrator::new(
        Arc::new(store),
        Arc::new(pipeline),
        config.selection.into(),
    ))
}

/// Run a single crawl batch
///
/// # Errors
///
/// Returns an error if wiring fails or the due accounts cannot be selected
pub async fn run_once(config: &CrawlerConfig) -> AppResult<RunReport> {
    build_orchestrator(config).await?.run().await
}
