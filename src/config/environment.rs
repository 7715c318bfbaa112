// ABOUTME: Environment configuration management for portal, store, and selection settings
// ABOUTME: Parses environment variables into typed configs and reports missing secrets as faults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based configuration management for production deployment

use crate::constants::{defaults, env_config, portal, schedule, selection, timeouts};
use crate::crawler::extractor::AnchorStrategy;
use crate::errors::{AppError, AppResult};
use crate::models::Secret;
use std::env;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Portal endpoints, deadlines, and the balance anchor
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Application root; always ends with `/`
    pub base_url: Url,
    /// Login servlet, relative to `base_url`
    pub login_path: String,
    /// Balance servlet, relative to `base_url`
    pub balance_path: String,
    /// Substring of the final login URL that means "rejected"
    pub rejection_marker: String,
    /// Deadline for each portal request
    pub request_timeout: Duration,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
    /// How the balance element is located
    pub anchor: AnchorStrategy,
}

impl PortalConfig {
    /// Portal settings pointing at `base_url` with every other value defaulted
    ///
    /// # Errors
    ///
    /// Returns a configuration fault if `base_url` is not an absolute URL
    pub fn with_base_url(base_url: &str) -> AppResult<Self> {
        Ok(Self {
            base_url: parse_base_url(env_config::PORTAL_BASE_URL, base_url)?,
            login_path: portal::LOGIN_PATH.to_owned(),
            balance_path: portal::BALANCE_PATH.to_owned(),
            rejection_marker: portal::REJECTION_MARKER.to_owned(),
            request_timeout: Duration::from_secs(timeouts::DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(timeouts::DEFAULT_CONNECT_TIMEOUT_SECS),
            anchor: AnchorStrategy::default(),
        })
    }

    /// Absolute login URL
    ///
    /// # Errors
    ///
    /// Returns a configuration fault if the path cannot be joined onto the base
    pub fn login_url(&self) -> AppResult<Url> {
        join(&self.base_url, &self.login_path, env_config::PORTAL_LOGIN_PATH)
    }

    /// Absolute balance URL
    ///
    /// # Errors
    ///
    /// Returns a configuration fault if the path cannot be joined onto the base
    pub fn balance_url(&self) -> AppResult<Url> {
        join(
            &self.base_url,
            &self.balance_path,
            env_config::PORTAL_BALANCE_PATH,
        )
    }
}

/// Which record store to use
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Local `SQLite` database
    Sqlite {
        /// `sqlite:` connection string
        database_url: String,
    },
    /// Hosted table API (`PostgREST` style)
    Rest {
        /// Project root; always ends with `/`
        base_url: Url,
        /// Service key, sent as `apikey` and bearer token
        api_key: Secret,
    },
}

impl StoreConfig {
    /// Short backend name for logs
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::Rest { .. } => "rest",
        }
    }
}

/// Which accounts a run picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Maximum accounts per run
    pub page_size: u32,
    /// Minimum age of the staleness marker, in hours
    pub staleness_hours: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            page_size: selection::DEFAULT_PAGE_SIZE,
            staleness_hours: selection::DEFAULT_STALENESS_HOURS,
        }
    }
}

/// Interval trigger settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Time between runs
    pub interval: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(schedule::DEFAULT_INTERVAL_MINUTES * 60),
        }
    }
}

/// Complete crawler configuration
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Portal settings
    pub portal: PortalConfig,
    /// Record store settings
    pub store: StoreConfig,
    /// Selection policy
    pub selection: SelectionConfig,
    /// Trigger settings
    pub schedule: ScheduleConfig,
}

impl CrawlerConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns a configuration fault if a required secret is missing or a value is invalid
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns a configuration fault if a required secret is missing or a value is invalid
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let base_url = var(env_config::PORTAL_BASE_URL)
            .unwrap_or_else(|| portal::DEFAULT_BASE_URL.to_owned());
        let mut portal = PortalConfig::with_base_url(&base_url)?;
        if let Some(path) = var(env_config::PORTAL_LOGIN_PATH) {
            portal.login_path = path;
        }
        if let Some(path) = var(env_config::PORTAL_BALANCE_PATH) {
            portal.balance_path = path;
        }
        if let Some(marker) = var(env_config::PORTAL_REJECTION_MARKER) {
            portal.rejection_marker = marker;
        }
        portal.request_timeout = Duration::from_secs(parse_positive(
            env_config::PORTAL_REQUEST_TIMEOUT_SECS,
            var(env_config::PORTAL_REQUEST_TIMEOUT_SECS),
            timeouts::DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        portal.connect_timeout = Duration::from_secs(parse_positive(
            env_config::PORTAL_CONNECT_TIMEOUT_SECS,
            var(env_config::PORTAL_CONNECT_TIMEOUT_SECS),
            timeouts::DEFAULT_CONNECT_TIMEOUT_SECS,
        )?);

        let element_selector = var(env_config::CREDIT_ELEMENT_SELECTOR)
            .unwrap_or_else(|| portal::CREDIT_ELEMENT_SELECTOR.to_owned());
        portal.anchor = match var(env_config::CREDIT_ANCHOR) {
            Some(raw) => AnchorStrategy::parse(&raw, &element_selector)
                .map_err(|reason| AppError::config_invalid(env_config::CREDIT_ANCHOR, reason))?,
            None => AnchorStrategy::ByPosition {
                selector: element_selector,
                index: portal::CREDIT_ELEMENT_INDEX,
            },
        };
        portal
            .anchor
            .validate()
            .map_err(|e| AppError::config_invalid(env_config::CREDIT_ANCHOR, e.to_string()))?;

        let store = match var(env_config::STORE_BACKEND).as_deref() {
            None | Some("sqlite") => StoreConfig::Sqlite {
                database_url: var(env_config::DATABASE_URL)
                    .unwrap_or_else(|| defaults::DATABASE_URL.to_owned()),
            },
            Some("rest") => {
                let url = var(env_config::STORE_URL)
                    .ok_or_else(|| AppError::config_missing(env_config::STORE_URL))?;
                let api_key = var(env_config::STORE_API_KEY)
                    .ok_or_else(|| AppError::config_missing(env_config::STORE_API_KEY))?;
                StoreConfig::Rest {
                    base_url: parse_base_url(env_config::STORE_URL, &url)?,
                    api_key: Secret::new(api_key),
                }
            }
            Some(other) => {
                return Err(AppError::config_invalid(
                    env_config::STORE_BACKEND,
                    format!("unknown backend `{other}` (expected `sqlite` or `rest`)"),
                ))
            }
        };

        let selection = SelectionConfig {
            page_size: parse_positive(
                env_config::CRAWL_BATCH_SIZE,
                var(env_config::CRAWL_BATCH_SIZE),
                selection::DEFAULT_PAGE_SIZE,
            )?,
            staleness_hours: at_most(
                env_config::CRAWL_STALENESS_HOURS,
                parse_positive(
                    env_config::CRAWL_STALENESS_HOURS,
                    var(env_config::CRAWL_STALENESS_HOURS),
                    selection::DEFAULT_STALENESS_HOURS,
                )?,
                selection::MAX_STALENESS_HOURS,
            )?,
        };

        let interval_minutes = at_most(
            env_config::CRAWL_INTERVAL_MINUTES,
            parse_positive(
                env_config::CRAWL_INTERVAL_MINUTES,
                var(env_config::CRAWL_INTERVAL_MINUTES),
                schedule::DEFAULT_INTERVAL_MINUTES,
            )?,
            schedule::MAX_INTERVAL_MINUTES,
        )?;
        let schedule = ScheduleConfig {
            interval: interval_minutes
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    AppError::config_invalid(env_config::CRAWL_INTERVAL_MINUTES, "too large")
                })?,
        };

        Ok(Self {
            portal,
            store,
            selection,
            schedule,
        })
    }

    /// Configuration summary for startup logs; secrets are never included
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = String::from("Meter credit crawler configuration:\n");
        let _ = writeln!(summary, "  portal: {}", self.portal.base_url);
        let _ = writeln!(
            summary,
            "  portal deadlines: request {}s, connect {}s",
            self.portal.request_timeout.as_secs(),
            self.portal.connect_timeout.as_secs()
        );
        let _ = writeln!(summary, "  balance anchor: {}", self.portal.anchor);
        match &self.store {
            StoreConfig::Sqlite { database_url } => {
                let _ = writeln!(summary, "  store: sqlite ({database_url})");
            }
            StoreConfig::Rest { base_url, .. } => {
                let _ = writeln!(summary, "  store: rest ({base_url}, api key set)");
            }
        }
        let _ = writeln!(
            summary,
            "  selection: up to {} accounts older than {}h",
            self.selection.page_size, self.selection.staleness_hours
        );
        let _ = write!(
            summary,
            "  schedule: every {} min",
            self.schedule.interval.as_secs() / 60
        );
        summary
    }
}

/// Parse an absolute URL and make sure relative joins keep its last segment
fn parse_base_url(name: &str, value: &str) -> AppResult<Url> {
    let normalized = if value.ends_with('/') {
        value.to_owned()
    } else {
        format!("{value}/")
    };
    Url::parse(&normalized).map_err(|e| AppError::config_invalid(name, e.to_string()))
}

fn join(base: &Url, path: &str, name: &str) -> AppResult<Url> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| AppError::config_invalid(name, e.to_string()))
}

fn parse_positive<T>(name: &str, value: Option<String>, default: T) -> AppResult<T>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = value else {
        return Ok(default);
    };
    let parsed = raw
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::config_invalid(name, format!("`{raw}` is not a number")))?;
    if parsed == T::default() {
        return Err(AppError::config_invalid(name, "must be greater than 0"));
    }
    Ok(parsed)
}

fn at_most<T>(name: &str, value: T, max: T) -> AppResult<T>
where
    T: PartialOrd + fmt::Display,
{
    if value > max {
        return Err(AppError::config_invalid(
            name,
            format!("`{value}` exceeds the maximum of {max}"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_match_portal() {
        let config = CrawlerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(
            config.portal.login_url().unwrap().as_str(),
            "https://nus-utown.evs.com.sg/EVSEntApp-war/loginServlet"
        );
        assert_eq!(
            config.portal.balance_url().unwrap().as_str(),
            "https://nus-utown.evs.com.sg/EVSEntApp-war/viewMeterCreditServlet"
        );
        assert_eq!(config.selection, SelectionConfig::default());
        assert_eq!(config.store.backend_name(), "sqlite");
    }

    #[test]
    fn test_rest_backend_requires_secrets() {
        let error =
            CrawlerConfig::from_lookup(lookup(&[("STORE_BACKEND", "rest")])).unwrap_err();
        assert_eq!(error.code, ErrorCode::ConfigMissing);
        assert!(error.message.contains("STORE_URL"));

        let error = CrawlerConfig::from_lookup(lookup(&[
            ("STORE_BACKEND", "rest"),
            ("STORE_URL", "https://example.supabase.co"),
        ]))
        .unwrap_err();
        assert!(error.message.contains("STORE_API_KEY"));
    }

    #[test]
    fn test_zero_batch_size_is_invalid() {
        let error =
            CrawlerConfig::from_lookup(lookup(&[("CRAWL_BATCH_SIZE", "0")])).unwrap_err();
        assert_eq!(error.code, ErrorCode::ConfigInvalid);
    }

    #[test]
    fn test_oversized_windows_are_invalid() {
        for (var, value) in [
            ("CRAWL_STALENESS_HOURS", "4000000000"),
            ("CRAWL_STALENESS_HOURS", "87601"),
            ("CRAWL_INTERVAL_MINUTES", "18446744073709551615"),
            ("CRAWL_INTERVAL_MINUTES", "10081"),
        ] {
            let error = CrawlerConfig::from_lookup(lookup(&[(var, value)])).unwrap_err();
            assert_eq!(error.code, ErrorCode::ConfigInvalid, "{var}={value}");
        }

        let config = CrawlerConfig::from_lookup(lookup(&[
            ("CRAWL_STALENESS_HOURS", "87600"),
            ("CRAWL_INTERVAL_MINUTES", "10080"),
        ]))
        .unwrap();
        assert_eq!(config.selection.staleness_hours, 87_600);
        assert_eq!(config.schedule.interval, Duration::from_secs(10_080 * 60));
    }

    #[test]
    fn test_summary_hides_api_key() {
        let config = CrawlerConfig::from_lookup(lookup(&[
            ("STORE_BACKEND", "rest"),
            ("STORE_URL", "https://example.supabase.co"),
            ("STORE_API_KEY", "service-role-secret"),
        ]))
        .unwrap();

        let summary = config.summary();
        assert!(summary.contains("rest"));
        assert!(!summary.contains("service-role-secret"));
    }
}
