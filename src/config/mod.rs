// ABOUTME: Configuration management module for crawler settings
// ABOUTME: Environment-only configuration for portal, record store, selection, and schedule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration module
//!
//! All settings come from environment variables; there is no configuration file.

/// Environment configuration
pub mod environment;

pub use environment::{CrawlerConfig, PortalConfig, ScheduleConfig, SelectionConfig, StoreConfig};
