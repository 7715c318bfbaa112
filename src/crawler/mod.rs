// ABOUTME: Portal crawler: login, balance fetch, HTML extraction, and their composition
// ABOUTME: Each stage makes at most one outbound call with an explicit deadline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Portal Crawler
//!
//! The portal has no API. One crawl is:
//!
//! 1. [`SessionAuthenticator`] posts the login form and collects session cookies
//! 2. [`CreditFetcher`] requests the balance page with those cookies
//! 3. [`CreditExtractor`] pulls the amount out of the HTML
//!
//! [`CrawlPipeline`] runs the three in order and returns a single
//! [`CrawlOutcome`](crate::models::CrawlOutcome).

/// Login handshake
pub mod authenticator;
/// HTML balance extraction
pub mod extractor;
/// Balance page request
pub mod fetcher;
/// Stage composition
pub mod pipeline;

pub use authenticator::SessionAuthenticator;
pub use extractor::{AnchorStrategy, CreditExtractor};
pub use fetcher::CreditFetcher;
pub use pipeline::{CrawlPipeline, CreditCrawler};
