// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Portal form fields, endpoints, selection defaults, and environment variable names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// Portal endpoints and login form
pub mod portal {
    /// Default portal application root
    pub const DEFAULT_BASE_URL: &str = "https://nus-utown.evs.com.sg/EVSEntApp-war";
    /// Login servlet path, relative to the base URL
    pub const LOGIN_PATH: &str = "loginServlet";
    /// Balance view servlet path, relative to the base URL
    pub const BALANCE_PATH: &str = "viewMeterCreditServlet";
    /// Substring of the post-redirect URL that signals rejected credentials
    pub const REJECTION_MARKER: &str = "Invalid";

    /// Login-id form field
    pub const LOGIN_ID_FIELD: &str = "txtLoginId";
    /// Password form field
    pub const PASSWORD_FIELD: &str = "txtPassword";
    /// Submit marker form field
    pub const SUBMIT_FIELD: &str = "btnLogin";
    /// Submit marker value
    pub const SUBMIT_VALUE: &str = "Login";

    /// Elements the portal uses to render labeled fields
    pub const CREDIT_ELEMENT_SELECTOR: &str = ".mainContent_normalText";
    /// Zero-based position of the balance among those elements
    pub const CREDIT_ELEMENT_INDEX: usize = 3;
    /// Currency symbol preceding the amount
    pub const CURRENCY_SYMBOL: char = '$';
}

/// Account selection defaults
pub mod selection {
    /// Maximum accounts selected per run
    pub const DEFAULT_PAGE_SIZE: u32 = 100;
    /// Minimum age of `last_updated_at` before an account is due again
    pub const DEFAULT_STALENESS_HOURS: u32 = 24;
    /// Largest accepted staleness window (ten years)
    pub const MAX_STALENESS_HOURS: u32 = 24 * 365 * 10;
}

/// Network timeouts for portal calls
pub mod timeouts {
    /// Deadline for a whole portal request, in seconds
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Deadline for establishing a connection, in seconds
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Schedule trigger defaults
pub mod schedule {
    /// Minutes between scheduled runs
    pub const DEFAULT_INTERVAL_MINUTES: u64 = 60;
    /// Largest accepted interval (one week)
    pub const MAX_INTERVAL_MINUTES: u64 = 60 * 24 * 7;
}

/// Record store table names
pub mod tables {
    /// REST store account table
    pub const REST_ACCOUNTS: &str = "Meter";
    /// REST store readings table
    pub const REST_READINGS: &str = "MeterReadings";
}

/// Service identity used in logs and the HTTP user agent
pub mod service_names {
    /// Service name
    pub const METER_CREDIT_CRAWLER: &str = "meter-credit-crawler";
}

/// Environment variable names
pub mod env_config {
    /// Portal application root
    pub const PORTAL_BASE_URL: &str = "PORTAL_BASE_URL";
    /// Login servlet path
    pub const PORTAL_LOGIN_PATH: &str = "PORTAL_LOGIN_PATH";
    /// Balance servlet path
    pub const PORTAL_BALANCE_PATH: &str = "PORTAL_BALANCE_PATH";
    /// Rejection marker substring
    pub const PORTAL_REJECTION_MARKER: &str = "PORTAL_REJECTION_MARKER";
    /// Per-request deadline
    pub const PORTAL_REQUEST_TIMEOUT_SECS: &str = "PORTAL_REQUEST_TIMEOUT_SECS";
    /// Connect deadline
    pub const PORTAL_CONNECT_TIMEOUT_SECS: &str = "PORTAL_CONNECT_TIMEOUT_SECS";
    /// CSS selector of the labeled-value elements
    pub const CREDIT_ELEMENT_SELECTOR: &str = "CREDIT_ELEMENT_SELECTOR";
    /// Anchor strategy (`position:<n>`, `label:<text>`, `selector:<css>`)
    pub const CREDIT_ANCHOR: &str = "CREDIT_ANCHOR";
    /// `sqlite` or `rest`
    pub const STORE_BACKEND: &str = "STORE_BACKEND";
    /// SQLite connection string
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// REST store base URL
    pub const STORE_URL: &str = "STORE_URL";
    /// REST store API key
    pub const STORE_API_KEY: &str = "STORE_API_KEY";
    /// Accounts per run
    pub const CRAWL_BATCH_SIZE: &str = "CRAWL_BATCH_SIZE";
    /// Staleness window in hours
    pub const CRAWL_STALENESS_HOURS: &str = "CRAWL_STALENESS_HOURS";
    /// Minutes between scheduled runs
    pub const CRAWL_INTERVAL_MINUTES: &str = "CRAWL_INTERVAL_MINUTES";
}

/// Defaults for settings that have one
pub mod defaults {
    /// Default SQLite location
    pub const DATABASE_URL: &str = "sqlite:./data/meter_credits.db";
}
