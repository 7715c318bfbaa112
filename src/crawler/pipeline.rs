// ABOUTME: Per-account crawl pipeline composing authenticate, fetch, and extract
// ABOUTME: Folds every failure into one CrawlOutcome; no retries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::authenticator::SessionAuthenticator;
use super::extractor::CreditExtractor;
use super::fetcher::CreditFetcher;
use crate::config::PortalConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{AuthFailureReason, Credential, CrawlOutcome};
use crate::utils::http_client::create_client_with_timeout;
use async_trait::async_trait;
use tracing::debug;

/// Anything that can turn a credential into a crawl outcome
#[async_trait]
pub trait CreditCrawler: Send + Sync {
    /// Crawl one account. Never fails: every fault is a `CrawlOutcome` variant.
    async fn crawl(&self, credential: &Credential) -> CrawlOutcome;
}

/// Authenticator → Fetcher → Extractor
#[derive(Debug, Clone)]
pub struct CrawlPipeline {
    authenticator: SessionAuthenticator,
    fetcher: CreditFetcher,
    extractor: CreditExtractor,
}

impl CrawlPipeline {
    /// Compose the three stages
    #[must_use]
    pub const fn new(
        authenticator: SessionAuthenticator,
        fetcher: CreditFetcher,
        extractor: CreditExtractor,
    ) -> Self {
        Self {
            authenticator,
            fetcher,
            extractor,
        }
    }

    /// Build the pipeline, and one shared cookie-less HTTP client, from portal settings
    ///
    /// # Errors
    ///
    /// Returns a configuration fault if a URL cannot be built, or an internal
    /// error if the HTTP client cannot be created
    pub fn from_config(config: &PortalConfig) -> AppResult<Self> {
        let client = create_client_with_timeout(config.request_timeout, config.connect_timeout)
            .map_err(|e| AppError::internal(format!("Failed to build portal client: {e}")))?;

        Ok(Self::new(
            SessionAuthenticator::new(
                client.clone(),
                config.login_url()?,
                config.rejection_marker.clone(),
                config.request_timeout,
            ),
            CreditFetcher::new(client, config.balance_url()?, config.request_timeout),
            CreditExtractor::new(config.anchor.clone()),
        ))
    }
}

#[async_trait]
impl CreditCrawler for CrawlPipeline {
    async fn crawl(&self, credential: &Credential) -> CrawlOutcome {
        let auth = match self.authenticator.authenticate(credential).await {
            Ok(auth) => auth,
            Err(e) => return CrawlOutcome::AuthFailure(AuthFailureReason::Transport(e.to_string())),
        };
        if !auth.is_authenticated() {
            return CrawlOutcome::AuthFailure(AuthFailureReason::Rejected);
        }
        let Some(session) = auth.into_session() else {
            return CrawlOutcome::AuthFailure(AuthFailureReason::MissingSession);
        };

        let body = match self.fetcher.fetch(session).await {
            Ok(body) => body,
            Err(e) => return CrawlOutcome::FetchFailure(e.to_string()),
        };
        debug!(
            account.id = %credential.account_id,
            page.bytes = body.len(),
            "Fetched balance page"
        );

        match self.extractor.extract(&body) {
            Ok(balance) => CrawlOutcome::Success(balance),
            Err(e) => CrawlOutcome::ParseFailure(e),
        }
    }
}
