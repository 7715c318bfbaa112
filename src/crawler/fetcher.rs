// ABOUTME: Requests the balance page with an authenticated session's cookies
// ABOUTME: Only transport errors fail; error pages are passed on to the extractor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::models::SessionToken;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::Client;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Fetches the balance view for one session
#[derive(Debug, Clone)]
pub struct CreditFetcher {
    client: Client,
    balance_url: Url,
    deadline: Duration,
}

impl CreditFetcher {
    /// Create a fetcher for the given balance URL
    #[must_use]
    pub const fn new(client: Client, balance_url: Url, deadline: Duration) -> Self {
        Self {
            client,
            balance_url,
            deadline,
        }
    }

    /// Fetch the balance page body.
    ///
    /// The session is consumed: it is good for exactly this one request.
    ///
    /// # Errors
    ///
    /// Returns the transport error when no response or no body arrived
    pub async fn fetch(&self, session: SessionToken) -> reqwest::Result<String> {
        let response = self
            .client
            .get(self.balance_url.clone())
            .header(ACCEPT, "text/html")
            .header(COOKIE, session.cookie_header())
            .timeout(self.deadline)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                http.status = %status,
                "Balance page returned a non-success status; handing body to extractor"
            );
        }

        response.text().await
    }
}
