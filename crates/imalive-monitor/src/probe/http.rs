use crate::config::MonitorDefinition;
use crate::outcome::{CheckOutcome, ConfigFailure, Failure, ProbeError};
use crate::pattern::StatusPattern;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::time::{Duration, Instant};

/// Supported request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    /// Parse a declared method (case-insensitive); `None` when unsupported
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            _ => None,
        }
    }

    /// Only POST and PUT send the declared body
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
        }
    }
}

/// Basic auth pair; the password never shows up in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Keep only RFC 7230 token characters of a header name
pub fn sanitize_header_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(*c))
        .collect()
}

/// A validated HTTP monitor
#[derive(Debug, Clone)]
pub struct HttpCheck {
    pub url: String,
    pub method: HttpMethod,
    pub expected_status: StatusPattern,
    pub expected_contain: Option<String>,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub auth: Option<BasicAuth>,
    pub check_tls: bool,
}

impl HttpCheck {
    pub fn from_definition(definition: &MonitorDefinition) -> Result<Self, ConfigFailure> {
        let url = non_empty(definition.url.as_deref()).ok_or(ConfigFailure::MissingUrl)?;

        let method = match definition.method.as_deref() {
            None => HttpMethod::Get,
            Some(raw) => {
                HttpMethod::parse(raw).ok_or_else(|| ConfigFailure::UnsupportedMethod {
                    method: raw.to_string(),
                })?
            }
        };

        let pattern = definition
            .expected_http_code
            .as_ref()
            .map(|code| code.to_string())
            .unwrap_or_else(|| StatusPattern::DEFAULT.to_string());
        let expected_status = StatusPattern::new(&pattern)
            .map_err(|_| ConfigFailure::InvalidStatusPattern { pattern })?;

        let headers = definition
            .headers
            .iter()
            .flatten()
            .filter_map(|header| {
                let name = sanitize_header_name(non_empty(header.name.as_deref())?);
                let value = header.value.as_ref()?.to_string();
                if name.is_empty() || value.is_empty() {
                    return None;
                }
                Some((name, value))
            })
            .collect();

        let auth = match (
            non_empty(definition.username.as_deref()),
            non_empty(definition.password.as_deref()),
        ) {
            (Some(username), Some(password)) => Some(BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => None,
        };

        Ok(Self {
            url: url.to_string(),
            method,
            expected_status,
            expected_contain: non_empty(definition.expected_contain.as_deref())
                .map(str::to_string),
            body: definition.body.clone(),
            headers,
            auth,
            check_tls: definition
                .check_tls
                .as_ref()
                .map(|flag| flag.is_true())
                .unwrap_or(true),
        })
    }

    /// Send one request and validate it: status pattern first, then the
    /// expected substring. The first failing step ends the check.
    pub async fn probe(&self, limit: Duration) -> CheckOutcome {
        let start = Instant::now();

        let response = match self.send(limit).await {
            Ok(response) => response,
            Err(error) => {
                return CheckOutcome::unhealthy(Failure::Transport {
                    error,
                    elapsed: None,
                })
            }
        };
        let elapsed = start.elapsed();

        let status = response.status().as_u16();
        if !self.expected_status.matches(status) {
            return CheckOutcome::unhealthy(Failure::StatusMismatch {
                expected: self.expected_status.to_string(),
                actual: status,
                elapsed,
            });
        }

        if let Some(expected) = &self.expected_contain {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    return CheckOutcome::unhealthy(Failure::UnreadableBody {
                        error: ProbeError::Request(describe(&e)),
                        elapsed,
                    })
                }
            };

            if !body.contains(expected.as_str()) {
                return CheckOutcome::unhealthy(Failure::content_mismatch(expected, &body, elapsed));
            }
        }

        CheckOutcome::healthy(elapsed)
    }

    async fn send(&self, limit: Duration) -> Result<reqwest::Response, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(limit)
            .danger_accept_invalid_certs(!self.check_tls)
            .build()
            .map_err(|e| ProbeError::Request(describe(&e)))?;

        let mut request = match self.method {
            HttpMethod::Get => client.get(&self.url),
            HttpMethod::Post => client.post(&self.url),
            HttpMethod::Put => client.put(&self.url),
        };

        request = request.headers(self.header_map()?);

        if let Some(auth) = &self.auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }

        if self.method.carries_body() {
            if let Some(body) = &self.body {
                request = request.body(body.clone());
            }
        }

        request
            .send()
            .await
            .map_err(|e| ProbeError::Request(describe(&e)))
    }

    fn header_map(&self) -> Result<HeaderMap, ProbeError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ProbeError::Request(format!("invalid header name {}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ProbeError::Request(format!("invalid value for header {}: {}", name, e)))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Error text including its source chain
fn describe(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
