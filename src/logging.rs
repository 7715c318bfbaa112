// ABOUTME: Logging configuration and structured logging setup for crawl runs
// ABOUTME: Configures log levels, formatters, and per-account outcome events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Production-ready logging configuration with structured output

use crate::constants::service_names;
use crate::orchestrator::{AccountReport, AccountStatus};
use anyhow::Result;
use std::env;
use std::io;
use tracing::{error, info, warn};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Emit span open/close events (one span per account)
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
            service_name: service_names::METER_CREDIT_CRAWLER.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service_names::METER_CREDIT_CRAWLER.into()),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment,
        }
    }

    /// Build the filter: the configured level for this crate, quiet HTTP and SQL internals
    fn env_filter(&self) -> EnvFilter {
        let base = env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        self.filter_from(&base)
    }

    fn filter_from(&self, base: &str) -> EnvFilter {
        [
            "hyper=warn",
            "hyper_util=warn",
            "reqwest=warn",
            "sqlx=warn",
            "html5ever=error",
            "selectors=error",
        ]
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .chain(
            // A directive list in RUST_LOG has no single crate level; keep it as given
            format!("meter_credit_crawler={}", self.level)
                .parse::<Directive>()
                .ok(),
        )
        .fold(EnvFilter::new(base), EnvFilter::add_directive)
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events)
                    .json();

                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events);

                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);

                registry.with(compact_layer).try_init()?;
            }
        }

        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Meter credit crawler starting up"
        );

        Ok(())
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured events for crawl runs
pub struct CrawlLogger;

impl CrawlLogger {
    /// Log the settled state of one account
    pub fn log_account_report(report: &AccountReport) {
        let account_id = report.account_id.as_str();
        match &report.status {
            AccountStatus::Updated { balance } => info!(
                account.id = %account_id,
                crawl.balance = %balance,
                "Recorded meter reading"
            ),
            AccountStatus::CrawlFailed(outcome) => warn!(
                account.id = %account_id,
                crawl.outcome = ?outcome.kind(),
                crawl.error = %outcome,
                "Crawl failed"
            ),
            AccountStatus::ReadingNotSaved { balance, error } => error!(
                account.id = %account_id,
                crawl.balance = %balance,
                store.error = %error,
                "Failed to save meter reading"
            ),
            AccountStatus::MarkerNotAdvanced { balance, error } => warn!(
                account.id = %account_id,
                crawl.balance = %balance,
                store.error = %error,
                "Reading saved but staleness marker not advanced; account stays due"
            ),
        }
    }

    /// Log a run-scoped fault
    pub fn log_run_failure(error: &dyn std::fmt::Display) {
        error!(run.error = %error, "Meter credit crawl aborted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.service_name, "meter-credit-crawler");
    }

    #[test]
    fn test_env_filter_includes_crate_level() {
        let config = LoggingConfig {
            level: "debug".into(),
            ..LoggingConfig::default()
        };
        assert!(config
            .env_filter()
            .to_string()
            .contains("meter_credit_crawler=debug"));
    }

    #[test]
    fn test_directive_list_keeps_its_default_level() {
        let config = LoggingConfig {
            level: "warn,sqlx=debug".into(),
            ..LoggingConfig::default()
        };
        let filter = config.filter_from("warn,sqlx=debug").to_string();

        assert!(!filter.contains("meter_credit_crawler"));
        assert!(filter
            .split(',')
            .all(|directive| !directive.eq_ignore_ascii_case("info")));
        assert!(filter
            .split(',')
            .any(|directive| directive.eq_ignore_ascii_case("warn")));
    }
}
