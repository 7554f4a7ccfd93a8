//! Result of evaluating one monitor in one cycle
//!
//! Every terminal state of a probe is a value here: healthy, invalid
//! configuration, transport error, status mismatch or content mismatch.
//! Nothing is retained across cycles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Longest response body excerpt quoted in a content mismatch message
const MAX_BODY_EXCERPT: usize = 512;

/// `ok` or `ko`, as reported in the `status` log field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Ko,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Ok => write!(f, "ok"),
            CheckStatus::Ko => write!(f, "ko"),
        }
    }
}

/// A check abandoned before any network attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigFailure {
    #[error("Bad configuration of monitor: name = {name}, type = {kind}")]
    UnknownType { name: String, kind: String },

    #[error("Missing mandatory url")]
    MissingUrl,

    #[error("Incorrect url (expected host:port): actual = {url}")]
    MalformedTcpTarget { url: String },

    #[error("Not supported http method: actual = {method}")]
    UnsupportedMethod { method: String },

    #[error("Invalid expected http code pattern: actual = {pattern}")]
    InvalidStatusPattern { pattern: String },
}

/// Transport-level failure caught at the probe boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// TCP connect failed (refused, timed out, unresolvable host...)
    #[error("Unable to open connection, e.type = {kind}, e.msg = {message}")]
    Connection { kind: String, message: String },

    /// Anything raised while sending an HTTP request or reading its response
    #[error("{0}")]
    Request(String),
}

/// Why a check ended unhealthy
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Config(ConfigFailure),
    Transport {
        error: ProbeError,
        elapsed: Option<Duration>,
    },
    StatusMismatch {
        expected: String,
        actual: u16,
        elapsed: Duration,
    },
    ContentMismatch {
        expected: String,
        body_excerpt: String,
        elapsed: Duration,
    },
    /// Response arrived but its body could not be read. `elapsed` is the
    /// time to the response headers; it feeds the gauge, not the event.
    UnreadableBody {
        error: ProbeError,
        elapsed: Duration,
    },
}

impl Failure {
    /// Build a content mismatch, keeping only the head of a large body
    pub fn content_mismatch(expected: &str, body: &str, elapsed: Duration) -> Self {
        let mut body_excerpt: String = body.chars().take(MAX_BODY_EXCERPT).collect();
        if body_excerpt.len() < body.len() {
            body_excerpt.push_str("...");
        }

        Failure::ContentMismatch {
            expected: expected.to_string(),
            body_excerpt,
            elapsed,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Failure::Config(failure) => failure.to_string(),
            Failure::Transport {
                error: error @ ProbeError::Connection { .. },
                ..
            } => error.to_string(),
            Failure::Transport {
                error: ProbeError::Request(_),
                ..
            }
            | Failure::UnreadableBody { .. } => "Unexpected error".to_string(),
            Failure::StatusMismatch {
                expected, actual, ..
            } => format!(
                "Not expected status code: expected = {}, actual = {}",
                expected, actual
            ),
            Failure::ContentMismatch {
                expected,
                body_excerpt,
                ..
            } => format!(
                "Response not valid: expected = {}, actual = {}",
                expected, body_excerpt
            ),
        }
    }

    /// Underlying error text, for transport failures only
    pub fn error(&self) -> Option<String> {
        match self {
            Failure::Transport {
                error: ProbeError::Connection { message, .. },
                ..
            } => Some(message.clone()),
            Failure::Transport {
                error: ProbeError::Request(message),
                ..
            } => Some(message.clone()),
            Failure::UnreadableBody { error, .. } => Some(error.to_string()),
            _ => None,
        }
    }

    /// Duration reported with the log event
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Failure::Config(_) | Failure::UnreadableBody { .. } => None,
            Failure::Transport { elapsed, .. } => *elapsed,
            Failure::StatusMismatch { elapsed, .. } | Failure::ContentMismatch { elapsed, .. } => {
                Some(*elapsed)
            }
        }
    }

    /// Time until a response arrived, when one did
    pub fn response_elapsed(&self) -> Option<Duration> {
        match self {
            Failure::Config(_) | Failure::Transport { .. } => None,
            Failure::StatusMismatch { elapsed, .. }
            | Failure::ContentMismatch { elapsed, .. }
            | Failure::UnreadableBody { elapsed, .. } => Some(*elapsed),
        }
    }
}

impl From<ConfigFailure> for Failure {
    fn from(failure: ConfigFailure) -> Self {
        Failure::Config(failure)
    }
}

/// Outcome of one probe run
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Healthy { elapsed: Duration },
    Unhealthy(Failure),
}

impl CheckOutcome {
    pub fn healthy(elapsed: Duration) -> Self {
        CheckOutcome::Healthy { elapsed }
    }

    pub fn unhealthy(failure: impl Into<Failure>) -> Self {
        CheckOutcome::Unhealthy(failure.into())
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, CheckOutcome::Healthy { .. })
    }

    pub fn status(&self) -> CheckStatus {
        if self.is_healthy() {
            CheckStatus::Ok
        } else {
            CheckStatus::Ko
        }
    }

    /// Value written to the result gauge
    pub fn result_value(&self) -> f64 {
        if self.is_healthy() {
            1.0
        } else {
            0.0
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            CheckOutcome::Healthy { elapsed } => Some(*elapsed),
            CheckOutcome::Unhealthy(failure) => failure.elapsed(),
        }
    }

    /// Value for the duration gauge: set once a response has arrived
    pub fn response_elapsed(&self) -> Option<Duration> {
        match self {
            CheckOutcome::Healthy { elapsed } => Some(*elapsed),
            CheckOutcome::Unhealthy(failure) => failure.response_elapsed(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            CheckOutcome::Healthy { .. } => "Monitor is healthy".to_string(),
            CheckOutcome::Unhealthy(failure) => failure.message(),
        }
    }

    pub fn error(&self) -> Option<String> {
        match self {
            CheckOutcome::Healthy { .. } => None,
            CheckOutcome::Unhealthy(failure) => failure.error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_outcome() {
        let outcome = CheckOutcome::healthy(Duration::from_millis(120));
        assert!(outcome.is_healthy());
        assert_eq!(outcome.status(), CheckStatus::Ok);
        assert_eq!(outcome.result_value(), 1.0);
        assert_eq!(outcome.message(), "Monitor is healthy");
        assert_eq!(outcome.elapsed(), Some(Duration::from_millis(120)));
        assert!(outcome.error().is_none());
    }

    #[test]
    fn test_config_failure_messages() {
        let outcome = CheckOutcome::unhealthy(ConfigFailure::UnknownType {
            name: "api".to_string(),
            kind: "undefined".to_string(),
        });
        assert_eq!(outcome.status(), CheckStatus::Ko);
        assert_eq!(outcome.result_value(), 0.0);
        assert_eq!(
            outcome.message(),
            "Bad configuration of monitor: name = api, type = undefined"
        );
        assert_eq!(outcome.elapsed(), None);

        let outcome = CheckOutcome::unhealthy(ConfigFailure::UnsupportedMethod {
            method: "DELETE".to_string(),
        });
        assert_eq!(outcome.message(), "Not supported http method: actual = DELETE");
    }

    #[test]
    fn test_transport_failures() {
        let tcp = Failure::Transport {
            error: ProbeError::Connection {
                kind: "ConnectionRefused".to_string(),
                message: "Connection refused (os error 111)".to_string(),
            },
            elapsed: Some(Duration::from_millis(3)),
        };
        assert!(tcp.message().contains("e.type = ConnectionRefused"));
        assert_eq!(
            tcp.error().as_deref(),
            Some("Connection refused (os error 111)")
        );
        assert_eq!(tcp.elapsed(), Some(Duration::from_millis(3)));

        let http = Failure::Transport {
            error: ProbeError::Request("dns error".to_string()),
            elapsed: None,
        };
        assert_eq!(http.message(), "Unexpected error");
        assert_eq!(http.error().as_deref(), Some("dns error"));
        assert_eq!(http.elapsed(), None);
    }

    #[test]
    fn test_unreadable_body_keeps_duration_out_of_event() {
        let failure = Failure::UnreadableBody {
            error: ProbeError::Request("error decoding response body".to_string()),
            elapsed: Duration::from_millis(40),
        };
        assert_eq!(failure.message(), "Unexpected error");
        assert_eq!(
            failure.error().as_deref(),
            Some("error decoding response body")
        );
        assert_eq!(failure.elapsed(), None);

        let outcome = CheckOutcome::unhealthy(failure);
        assert_eq!(outcome.elapsed(), None);
        assert_eq!(outcome.response_elapsed(), Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_mismatch_messages() {
        let status = Failure::StatusMismatch {
            expected: "20*".to_string(),
            actual: 503,
            elapsed: Duration::from_millis(8),
        };
        assert_eq!(
            status.message(),
            "Not expected status code: expected = 20*, actual = 503"
        );

        let content = Failure::content_mismatch("pong", "nope", Duration::from_millis(8));
        assert_eq!(
            content.message(),
            "Response not valid: expected = pong, actual = nope"
        );
        assert_eq!(content.elapsed(), Some(Duration::from_millis(8)));
    }

    #[test]
    fn test_large_body_is_truncated() {
        let body = "x".repeat(2000);
        match Failure::content_mismatch("pong", &body, Duration::ZERO) {
            Failure::ContentMismatch { body_excerpt, .. } => {
                assert_eq!(body_excerpt.len(), MAX_BODY_EXCERPT + 3);
                assert!(body_excerpt.ends_with("..."));
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&CheckStatus::Ko).unwrap(), "\"ko\"");
        assert_eq!(CheckStatus::Ok.to_string(), "ok");
    }
}
