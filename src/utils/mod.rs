// ABOUTME: Utility module for shared helpers
// ABOUTME: HTTP client construction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// HTTP client construction
pub mod http_client;
