//! Wire types for the solver JSON protocol
//!
//! Every command is a POST of a JSON object tagged by `cmd`:
//!
//! | Command | Payload | Response |
//! |---------|---------|----------|
//! | `sessions.create` | - | `{session}` |
//! | `request.get` | `{url, maxTimeout, session}` | `{status, message, solution: {response}}` |
//! | `sessions.destroy` | `{session}` | ignored |

use serde::{Deserialize, Serialize};

/// A command sent to the solver endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd")]
pub enum SolverCommand<'a> {
    #[serde(rename = "sessions.create")]
    SessionsCreate,

    #[serde(rename = "request.get", rename_all = "camelCase")]
    RequestGet {
        url: &'a str,
        max_timeout: u64,
        session: &'a str,
    },

    #[serde(rename = "sessions.destroy")]
    SessionsDestroy { session: &'a str },
}

impl SolverCommand<'_> {
    /// The command name as sent on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionsCreate => "sessions.create",
            Self::RequestGet { .. } => "request.get",
            Self::SessionsDestroy { .. } => "sessions.destroy",
        }
    }
}

/// Response envelope shared by all solver commands
///
/// Fields are optional because each command fills in a different subset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolverResponse {
    /// `"ok"` or `"error"`
    #[serde(default)]
    pub status: Option<String>,

    /// Human-readable status message, carries the error on failure
    #[serde(default)]
    pub message: Option<String>,

    /// Session token returned by `sessions.create`
    #[serde(default)]
    pub session: Option<String>,

    /// Page load result returned by `request.get`
    #[serde(default)]
    pub solution: Option<Solution>,
}

impl SolverResponse {
    /// Returns true unless the solver explicitly reported a failure
    pub fn is_ok(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s.eq_ignore_ascii_case("ok"))
    }

    /// The solver's message, or a generic description when absent
    pub fn error_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("solver status '{}'", self.status.as_deref().unwrap_or("")))
    }
}

/// The page load performed by the solver's browser
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Solution {
    /// Final URL after the browser settled
    #[serde(default)]
    pub url: Option<String>,

    /// HTTP status of the upstream page
    #[serde(default)]
    pub status: Option<u16>,

    /// Rendered HTML
    #[serde(default)]
    pub response: Option<String>,
}
