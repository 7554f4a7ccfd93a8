use crate::outcome::{CheckOutcome, ConfigFailure, Failure, ProbeError};
use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

fn target_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9.-]+:\d+$").expect("Static regex should always compile")
    })
}

/// `host:port` target of a TCP monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpTarget {
    pub host: String,
    pub port: u16,
}

impl TcpTarget {
    /// Validate the declared url. Host is letters, digits, dots and hyphens;
    /// port is digits and must fit in a u16.
    pub fn from_url(url: Option<&str>) -> Result<Self, ConfigFailure> {
        let url = url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigFailure::MissingUrl)?;

        let malformed = || ConfigFailure::MalformedTcpTarget {
            url: url.to_string(),
        };

        if !target_pattern().is_match(url) {
            return Err(malformed());
        }

        let (host, port) = url.rsplit_once(':').ok_or_else(malformed)?;
        let port = port.parse::<u16>().map_err(|_| malformed())?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Open one connection and drop it. No retry; the next cycle is the retry.
    pub async fn probe(&self, limit: Duration) -> CheckOutcome {
        let start = Instant::now();

        let error = match timeout(limit, TcpStream::connect((self.host.as_str(), self.port))).await
        {
            Ok(Ok(_stream)) => return CheckOutcome::healthy(start.elapsed()),
            Ok(Err(e)) => ProbeError::Connection {
                kind: format!("{:?}", e.kind()),
                message: e.to_string(),
            },
            Err(_) => ProbeError::Connection {
                kind: "TimedOut".to_string(),
                message: format!("connection timed out after {:.3}s", limit.as_secs_f64()),
            },
        };

        CheckOutcome::unhealthy(Failure::Transport {
            error,
            elapsed: Some(start.elapsed()),
        })
    }
}

impl std::fmt::Display for TcpTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_targets() {
        let target = TcpTarget::from_url(Some("db-01.internal:5432")).unwrap();
        assert_eq!(target.host, "db-01.internal");
        assert_eq!(target.port, 5432);
        assert_eq!(target.to_string(), "db-01.internal:5432");

        assert!(TcpTarget::from_url(Some("127.0.0.1:80")).is_ok());
    }

    #[test]
    fn test_missing_url() {
        assert_eq!(TcpTarget::from_url(None), Err(ConfigFailure::MissingUrl));
        assert_eq!(TcpTarget::from_url(Some("  ")), Err(ConfigFailure::MissingUrl));
    }

    #[test]
    fn test_malformed_targets() {
        for url in [
            "db",
            "db:",
            ":80",
            "http://db:80",
            "db:80/path",
            "under_score:80",
            "db:99999",
        ] {
            assert_eq!(
                TcpTarget::from_url(Some(url)),
                Err(ConfigFailure::MalformedTcpTarget {
                    url: url.to_string()
                }),
                "{} should be rejected",
                url
            );
        }
    }

    #[tokio::test]
    async fn test_probe_listening_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let target = TcpTarget::from_url(Some(&format!("127.0.0.1:{}", port))).unwrap();
        let outcome = target.probe(Duration::from_secs(2)).await;
        assert!(outcome.is_healthy());
    }

    #[tokio::test]
    async fn test_probe_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = TcpTarget::from_url(Some(&format!("127.0.0.1:{}", port))).unwrap();
        let outcome = target.probe(Duration::from_secs(2)).await;

        assert!(!outcome.is_healthy());
        assert!(outcome.message().contains("ConnectionRefused"));
        assert!(outcome.elapsed().is_some());
    }
}
