// # SBAT HTTP API Client
//
// reqwest-backed implementation of the `Authenticator` and `SlotSource`
// traits against the SBAT practical exam REST API.
//
// The client is deliberately thin: one HTTP request per trait call, full
// error propagation, no retries and no caching. Retry cadence, token
// lifecycle and change detection are owned by the core watcher.
//
// ## Wire quirks
//
// - The identity endpoint returns the bearer token as the raw response body,
//   usually wrapped in double quotes. It is not a JSON object.
// - Availability queries are POSTs with a camelCase JSON body; the start
//   date must be recomputed for every request so a long-running session
//   keeps asking about tomorrow, not about the day it was started.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use sbat_core::traits::{Authenticator, FetchError, SlotSource};
use sbat_core::types::{Center, Credentials, QueryTemplate, Slot};
use sbat_core::{Error, Result};

/// Production API base, without a trailing slash
pub const DEFAULT_BASE_URL: &str = "https://api.rijbewijs.sbat.be/praktijk/api";

const AUTH_PATH: &str = "/user/authenticate";
const AVAILABLE_PATH: &str = "/exam/available";

/// The identity endpoint is small and fast; a hung request here should
/// fail the session quickly.
const AUTH_TIMEOUT: Duration = Duration::from_secs(15);

/// Availability queries can be slow when the scheduler is under load.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str = concat!("sbat-watch/", env!("CARGO_PKG_VERSION"));

/// How much response body to carry into error messages
const BODY_EXCERPT_LEN: usize = 200;

/// SBAT REST API client
///
/// Cheap to clone; clones share the underlying connection pool, so a single
/// client can serve as both the `Authenticator` and the `SlotSource` of a
/// watcher.
#[derive(Debug, Clone)]
pub struct SbatApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl SbatApiClient {
    /// Create a client against the given base URL (no trailing slash needed)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::other(format!("failed to build HTTP client: {e}")))?;

        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a client against the production SBAT API
    pub fn production() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[async_trait]
impl Authenticator for SbatApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// Transport failures are reported as authentication errors with no
    /// status: from the session's point of view an unreachable identity
    /// endpoint and rejected credentials end it the same way.
    async fn authenticate(&self, credentials: &Credentials) -> Result<String> {
        let url = format!("{}{}", self.base_url, AUTH_PATH);
        debug!("authenticating against {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(AUTH_TIMEOUT)
            .json(credentials)
            .send()
            .await
            .map_err(|e| Error::authentication(None, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::authentication(
                Some(status.as_u16()),
                format!("unreadable response body: {e}"),
            )
        })?;

        // The token arrives as the raw body, wrapped in quotes.
        let token = body.trim().trim_matches('"').to_string();

        if status.is_success() && !token.is_empty() {
            Ok(token)
        } else {
            let detail = if body.trim().is_empty() {
                format!("status {status}, empty body")
            } else {
                format!("status {status}: {}", excerpt(&body))
            };
            Err(Error::authentication(Some(status.as_u16()), detail))
        }
    }
}

#[async_trait]
impl SlotSource for SbatApiClient {
    /// Query one center's available slots.
    ///
    /// The request body is built fresh from the template on every call so
    /// the start date tracks the current day.
    async fn fetch(
        &self,
        token: &str,
        center: &Center,
        template: &QueryTemplate,
    ) -> std::result::Result<Vec<Slot>, FetchError> {
        let url = format!("{}{}", self.base_url, AVAILABLE_PATH);
        let query = template.query_for(center.id);

        let response = self
            .client
            .post(&url)
            .timeout(FETCH_TIMEOUT)
            .bearer_auth(token)
            .json(&query)
            .send()
            .await
            .map_err(|e| FetchError::Request(format!("request failed: {e}")))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::AuthExpired);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Request(format!(
                "status {status}: {}",
                excerpt(&body)
            )));
        }

        response
            .json::<Vec<Slot>>()
            .await
            .map_err(|e| FetchError::Request(format!("malformed response: {e}")))
    }
}
