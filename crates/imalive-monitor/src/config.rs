//! Monitor configuration file
//!
//! The file is YAML with a top-level `monitors` list. Every field of a
//! monitor is optional at this layer; classification into runnable checks
//! happens in [`crate::descriptor`].

use crate::error::{MonitorError, Result};
use crate::metrics::metric_name;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Configuration loaded once at agent startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Monitor definitions in declared order
    #[serde(default)]
    pub monitors: Vec<MonitorDefinition>,
}

/// Raw definition of one monitor, as written in the config file
///
/// `username` and `password` are never serialized, so the serialized form
/// of a definition is its credential-free copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorDefinition {
    /// Unique monitor name, used as identity and in metric names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Grouping label, defaults to the name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    /// Probe type (`http` or `tcp`)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Full URL for http, `host:port` for tcp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP method (GET, POST or PUT)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Expected status code pattern, e.g. `20*`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_http_code: Option<Scalar>,

    /// Substring the response body must contain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_contain: Option<String>,

    /// Request payload for POST and PUT
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Extra request headers, in declared order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HeaderDefinition>>,

    /// Basic auth user
    #[serde(skip_serializing)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Verify TLS certificates (default true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_tls: Option<Scalar>,

    /// Timeout in seconds (default 30)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Scalar>,

    /// Log level of success events (INFO or DEBUG)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// One `name`/`value` request header entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderDefinition {
    pub name: Option<String>,
    pub value: Option<Scalar>,
}

/// A YAML scalar accepted where the config is lenient about types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Truthiness of the scalar: `true`, non-zero numbers and the strings
    /// `true`/`yes`/`on`/`1` (any case)
    pub fn is_true(&self) -> bool {
        match self {
            Scalar::Bool(value) => *value,
            Scalar::Integer(value) => *value != 0,
            Scalar::Float(value) => *value != 0.0,
            Scalar::Text(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "on" | "1"
            ),
        }
    }

    /// Numeric value, parsing text when needed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Bool(_) => None,
            Scalar::Integer(value) => Some(*value as f64),
            Scalar::Float(value) => Some(*value),
            Scalar::Text(value) => value.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => write!(f, "{}", value),
            Scalar::Integer(value) => write!(f, "{}", value),
            Scalar::Float(value) => write!(f, "{}", value),
            Scalar::Text(value) => f.write_str(value),
        }
    }
}

impl MonitorDefinition {
    /// Declared name, if present and not blank
    pub fn declared_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl AgentConfig {
    /// Load and validate the configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| MonitorError::Config {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        Self::from_yaml_str(&raw)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: AgentConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject duplicate monitor names, and distinct names that map to the
    /// same metric name
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let mut metrics: HashMap<String, &str> = HashMap::new();
        for name in self.monitors.iter().filter_map(|m| m.declared_name()) {
            if !seen.insert(name) {
                return Err(MonitorError::Config {
                    message: format!("Duplicate monitor name: {}", name),
                });
            }

            let metric = metric_name(name, "result");
            if let Some(other) = metrics.insert(metric.clone(), name) {
                return Err(MonitorError::Config {
                    message: format!(
                        "Monitor names {} and {} share the metric name {}",
                        other, name, metric
                    ),
                });
            }
        }

        Ok(())
    }

    /// Monitors that carry a name; the others are ignored entirely
    pub fn named_monitors(&self) -> impl Iterator<Item = &MonitorDefinition> {
        self.monitors.iter().filter(|m| m.declared_name().is_some())
    }
}
