// ABOUTME: Portal login handshake that turns a credential into a session cookie set
// ABOUTME: Judges success by the post-redirect URL, never by HTTP status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::constants::portal;
use crate::models::{AuthResult, Credential, SessionToken};
use reqwest::header::{ACCEPT, SET_COOKIE};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Submits credentials to the portal login form
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    client: Client,
    login_url: Url,
    rejection_marker: String,
    deadline: Duration,
}

impl SessionAuthenticator {
    /// Create an authenticator for the given login URL
    #[must_use]
    pub fn new(
        client: Client,
        login_url: Url,
        rejection_marker: impl Into<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            client,
            login_url,
            rejection_marker: rejection_marker.into(),
            deadline,
        }
    }

    /// Log in once.
    ///
    /// A rejected login is `Ok` with `authenticated == false`. The portal answers
    /// a bad password with a redirect to an error page that still returns 200, so
    /// the verdict comes from the final URL only.
    ///
    /// # Errors
    ///
    /// Returns the transport error when no response arrived (including deadline expiry)
    pub async fn authenticate(&self, credential: &Credential) -> reqwest::Result<AuthResult> {
        let form = [
            (portal::LOGIN_ID_FIELD, credential.account_id.as_str()),
            (portal::PASSWORD_FIELD, credential.secret.expose()),
            (portal::SUBMIT_FIELD, portal::SUBMIT_VALUE),
        ];

        let response = self
            .client
            .post(self.login_url.clone())
            .header(ACCEPT, "text/html")
            .form(&form)
            .timeout(self.deadline)
            .send()
            .await?;

        let final_url = response.url().clone();
        let status = response.status();
        if final_url.as_str().contains(&self.rejection_marker) {
            debug!(
                account.id = %credential.account_id,
                http.status = %status,
                "Portal redirected to its invalid-credential page"
            );
            return Ok(AuthResult::rejected());
        }

        let session = SessionToken::from_set_cookie_values(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        debug!(
            account.id = %credential.account_id,
            http.status = %status,
            session.cookies = session.cookies().len(),
            "Portal accepted login"
        );

        Ok(AuthResult::accepted(session))
    }
}
