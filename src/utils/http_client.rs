// ABOUTME: HTTP client construction with connection pooling and timeout configuration
// ABOUTME: Builds the cookie-less portal client and the record store client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::constants::service_names;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Store requests are small; they get a fixed deadline
const STORE_TIMEOUT_SECS: u64 = 15;
const STORE_CONNECT_TIMEOUT_SECS: u64 = 5;

fn user_agent() -> String {
    format!(
        "{}/{}",
        service_names::METER_CREDIT_CRAWLER,
        env!("CARGO_PKG_VERSION")
    )
}

/// Create a new HTTP client with custom timeout settings
///
/// The client keeps no cookie store: session cookies travel only through
/// explicit `Cookie` headers, so nothing leaks between accounts sharing it.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized
pub fn create_client_with_timeout(
    timeout: Duration,
    connect_timeout: Duration,
) -> reqwest::Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .user_agent(user_agent())
        .build()
}

/// Client for record store API calls
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized
pub fn store_client() -> reqwest::Result<Client> {
    create_client_with_timeout(
        Duration::from_secs(STORE_TIMEOUT_SECS),
        Duration::from_secs(STORE_CONNECT_TIMEOUT_SECS),
    )
}
