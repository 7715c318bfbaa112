// ABOUTME: Core data models for the meter credit crawler
// ABOUTME: Re-exports account, session, and crawl outcome types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Data Models
//!
//! - `Credential`, `AccountRecord`, `NewReading`: what the record store hands
//!   out and takes back
//! - `SessionToken`, `AuthResult`: portal login state, scoped to one crawl
//! - `Balance`, `CrawlOutcome`: what one crawl produces

mod account;
mod outcome;
mod session;

pub use account::{AccountId, AccountRecord, Credential, NewReading, Secret};
pub use outcome::{AuthFailureReason, Balance, CrawlOutcome, OutcomeKind};
pub use session::{AuthResult, SessionToken};
