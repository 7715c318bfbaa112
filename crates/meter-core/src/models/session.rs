// ABOUTME: Portal session cookies and the login verdict produced by authentication
// ABOUTME: Splits flattened Set-Cookie values and renders the Cookie request header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Session state for exactly one crawl.
//!
//! A [`SessionToken`] is created by the authenticator, moved into the fetcher,
//! and dropped when the crawl ends. It is deliberately neither `Clone` nor
//! serializable.

/// Ordered cookie strings issued by a successful login
#[derive(Debug, PartialEq, Eq)]
pub struct SessionToken {
    cookies: Vec<String>,
}

impl SessionToken {
    /// Build a token from `Set-Cookie` header values.
    ///
    /// Each value may hold several cookies flattened onto one header and
    /// separated by commas; they are split apart in order.
    pub fn from_set_cookie_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cookies = values
            .into_iter()
            .flat_map(|value| split_set_cookie(value.as_ref()))
            .collect();
        Self { cookies }
    }

    /// The cookie strings, in the order they were issued
    #[must_use]
    pub fn cookies(&self) -> &[String] {
        &self.cookies
    }

    /// True when the login response carried no cookie
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Render the `Cookie` request header: `name=value; name=value`.
    ///
    /// Attributes such as `Path` or `HttpOnly` are only meaningful in
    /// `Set-Cookie` and are not echoed back. Fragments without a `=` are
    /// dropped.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .filter_map(|cookie| {
                let pair = cookie.split(';').next().unwrap_or_default().trim();
                // Comma splitting can leave `Expires` date fragments behind
                pair.contains('=').then_some(pair)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Split one `Set-Cookie` header value into distinct cookie strings
#[must_use]
pub fn split_set_cookie(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|cookie| !cookie.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Verdict of one login attempt
#[derive(Debug)]
pub struct AuthResult {
    authenticated: bool,
    session: Option<SessionToken>,
}

impl AuthResult {
    /// The portal rejected the credentials
    #[must_use]
    pub const fn rejected() -> Self {
        Self {
            authenticated: false,
            session: None,
        }
    }

    /// The portal accepted the credentials; `session` is `None` when no cookie came back
    #[must_use]
    pub fn accepted(session: SessionToken) -> Self {
        Self {
            authenticated: true,
            session: (!session.is_empty()).then_some(session),
        }
    }

    /// Whether the login was accepted
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Borrow the session, if any
    #[must_use]
    pub const fn session(&self) -> Option<&SessionToken> {
        self.session.as_ref()
    }

    /// Consume the result, handing the session to the fetcher
    #[must_use]
    pub fn into_session(self) -> Option<SessionToken> {
        self.session
    }
}
