//! Session-scoped solver client
//!
//! A `SolverClient` owns exactly one remote browser session. The session is
//! created by [`SolverClient::open`], attached to every page fetch, and destroyed
//! by [`SolverClient::close`]. After `close` every fetch fails with
//! [`SolverError::SessionClosed`], whether or not the destroy command succeeded.

use crate::config::SolverConfig;
use crate::solver::protocol::{SolverCommand, SolverResponse};
use crate::{SolverError, SolverResult};
use async_trait::async_trait;
use futures::FutureExt;
use reqwest::Client;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Opaque token identifying a solver-side browser session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverSession(String);

impl SolverSession {
    /// Returns the raw token as sent on the wire
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single page fetch, built per page
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub target_url: String,
    pub timeout_ms: u64,
    pub session: SolverSession,
}

impl FetchRequest {
    fn command(&self) -> SolverCommand<'_> {
        SolverCommand::RequestGet {
            url: &self.target_url,
            max_timeout: self.timeout_ms,
            session: self.session.as_str(),
        }
    }
}

/// Raw page content returned by the solver
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Rendered HTML of the page
    pub raw_html: String,

    /// False when the upstream page answered with a non-2xx status
    pub status_ok: bool,
}

/// Something that turns a URL into page HTML
///
/// The crawl driver only depends on this trait, so it can be run against
/// the real solver or an in-memory page set.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches a page, waiting at most `timeout` for the page load
    async fn fetch_page(&self, url: &str, timeout: Duration) -> SolverResult<FetchResult>;
}

#[derive(Debug)]
enum SessionState {
    Open(SolverSession),
    Closed,
}

/// Client bound to one solver session
pub struct SolverClient {
    http: Client,
    endpoint: String,
    state: RwLock<SessionState>,
}

impl SolverClient {
    /// Creates a remote session on the solver and returns a client bound to it
    ///
    /// # Errors
    ///
    /// * `SolverError::Unreachable` - the endpoint could not be dialed
    /// * `SolverError::Protocol` - the response did not carry a session token
    pub async fn open(config: &SolverConfig) -> SolverResult<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| SolverError::Protocol("no solver endpoint configured".to_string()))?;

        let http = build_solver_client(config).map_err(|source| SolverError::Unreachable {
            endpoint: endpoint.clone(),
            source,
        })?;

        tracing::debug!("Requesting new solver session from {}", endpoint);

        let command = SolverCommand::SessionsCreate;
        let response = http
            .post(&endpoint)
            .json(&command)
            .send()
            .await
            .map_err(|source| SolverError::Unreachable {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SolverError::Protocol(format!("failed to read session response: {}", e)))?;

        if !status.is_success() {
            return Err(SolverError::Protocol(format!(
                "{} returned HTTP {}: {}",
                command.name(),
                status.as_u16(),
                body
            )));
        }

        let decoded: SolverResponse = serde_json::from_str(&body)
            .map_err(|e| SolverError::Protocol(format!("undecodable session response: {}", e)))?;

        let session = decoded
            .session
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SolverError::Protocol("session response has no session token".to_string()))?;

        tracing::info!("Opened solver session {}", session);

        Ok(Self {
            http,
            endpoint,
            state: RwLock::new(SessionState::Open(SolverSession(session))),
        })
    }

    /// Returns the active session, or `SessionClosed`
    pub fn session(&self) -> SolverResult<SolverSession> {
        let state = self.state.read().map_err(|_| SolverError::SessionClosed)?;
        match &*state {
            SessionState::Open(session) => Ok(session.clone()),
            SessionState::Closed => Err(SolverError::SessionClosed),
        }
    }

    /// Returns true once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.session().is_err()
    }

    /// Loads `url` in the session's browser and returns the rendered HTML
    ///
    /// `timeout` is handed to the solver as its page-load budget; the HTTP
    /// request itself is bounded by the client's configured timeout.
    ///
    /// # Errors
    ///
    /// * `SolverError::SessionClosed` - the session was already destroyed
    /// * `SolverError::FetchTimeout` - the solver or the HTTP request timed out
    /// * `SolverError::FetchFailed` - the solver reported a failure
    /// * `SolverError::Protocol` - the response envelope had an unexpected shape
    pub async fn fetch_page(&self, url: &str, timeout: Duration) -> SolverResult<FetchResult> {
        let request = FetchRequest {
            target_url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
            session: self.session()?,
        };

        tracing::debug!("Requesting page {}", request.target_url);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request.command())
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let decoded: SolverResponse = match serde_json::from_str(&body) {
            Ok(decoded) => decoded,
            Err(_) if !status.is_success() => {
                return Err(SolverError::FetchFailed {
                    url: url.to_string(),
                    message: format!("solver returned HTTP {}", status.as_u16()),
                })
            }
            Err(e) => {
                return Err(SolverError::Protocol(format!(
                    "undecodable response for {}: {}",
                    url, e
                )))
            }
        };

        if !decoded.is_ok() || !status.is_success() {
            let message = decoded.error_message();
            if message.to_ascii_lowercase().contains("timeout") {
                return Err(SolverError::FetchTimeout {
                    url: url.to_string(),
                });
            }
            return Err(SolverError::FetchFailed {
                url: url.to_string(),
                message,
            });
        }

        let solution = decoded
            .solution
            .ok_or_else(|| SolverError::Protocol(format!("response for {} has no solution", url)))?;

        let raw_html = solution
            .response
            .ok_or_else(|| SolverError::Protocol(format!("solution for {} has no response", url)))?;

        let status_ok = solution
            .status
            .map_or(true, |code| (200..300).contains(&code));

        if !status_ok {
            tracing::warn!(
                "Upstream answered {} with HTTP {}",
                url,
                solution.status.unwrap_or_default()
            );
        }

        Ok(FetchResult {
            raw_html,
            status_ok,
        })
    }

    /// Destroys the remote session
    ///
    /// The client is marked closed before the destroy command is sent, so it
    /// is unusable afterwards even if this returns an error. Closing an
    /// already-closed client is a no-op.
    pub async fn close(&self) -> SolverResult<()> {
        let previous = {
            let mut state = self.state.write().map_err(|_| SolverError::SessionClosed)?;
            std::mem::replace(&mut *state, SessionState::Closed)
        };

        let session = match previous {
            SessionState::Open(session) => session,
            SessionState::Closed => return Ok(()),
        };

        tracing::debug!("Destroying solver session {}", session.as_str());

        let command = SolverCommand::SessionsDestroy {
            session: session.as_str(),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&command)
            .send()
            .await
            .map_err(|source| SolverError::Unreachable {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(SolverError::Protocol(format!(
                "{} returned HTTP {}",
                command.name(),
                response.status().as_u16()
            )));
        }

        tracing::info!("Closed solver session {}", session.as_str());
        Ok(())
    }
}

#[async_trait]
impl PageSource for SolverClient {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> SolverResult<FetchResult> {
        SolverClient::fetch_page(self, url, timeout).await
    }
}

/// Builds the HTTP client used for all solver commands
pub fn build_solver_client(config: &SolverConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}

fn classify_transport_error(url: &str, error: reqwest::Error) -> SolverError {
    if error.is_timeout() {
        SolverError::FetchTimeout {
            url: url.to_string(),
        }
    } else {
        SolverError::FetchFailed {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Runs `work` inside a solver session that is always destroyed afterwards
///
/// The session is opened before `work` starts and closed after it returns,
/// whatever its outcome. A failing close is logged; the result of `work` is
/// returned unchanged. If `work` panics, the session is closed before the
/// panic is resumed.
pub async fn with_session<T, E, F, Fut>(config: &SolverConfig, work: F) -> Result<T, E>
where
    F: FnOnce(Arc<SolverClient>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<SolverError>,
{
    let client = Arc::new(SolverClient::open(config).await?);

    let outcome = AssertUnwindSafe(work(Arc::clone(&client)))
        .catch_unwind()
        .await;

    if let Err(e) = client.close().await {
        tracing::warn!("Failed to destroy solver session: {}", e);
    }

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
