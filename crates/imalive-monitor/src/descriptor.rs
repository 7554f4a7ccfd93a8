//! Monitor descriptors
//!
//! A [`MonitorDefinition`] is normalized exactly once, at load time, into a
//! [`Monitor`]: labels, log level, timeout, a credential-free copy for
//! logging, and a [`Check`] that is either runnable or a recorded
//! configuration failure. Normalization never fails; absent or invalid
//! optional fields fall back to their defaults.

use crate::config::{MonitorDefinition, Scalar};
use crate::outcome::ConfigFailure;
use crate::probe::{HttpCheck, TcpTarget};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout applied when a monitor declares none
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Log level of monitor events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl LogLevel {
    /// Level used for success events. Only INFO and DEBUG are accepted,
    /// anything else falls back to DEBUG.
    pub fn for_success(raw: Option<&str>) -> Self {
        match raw.map(|level| level.trim().to_ascii_uppercase()).as_deref() {
            Some("INFO") => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// `{name, family}` pair attached to every sample of a monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorLabels {
    pub name: String,
    pub family: String,
}

impl MonitorLabels {
    pub fn new(name: &str, family: Option<&str>) -> Self {
        let family = family
            .map(str::trim)
            .filter(|family| !family.is_empty())
            .unwrap_or(name);

        Self {
            name: name.to_string(),
            family: family.to_string(),
        }
    }

    /// Label values in `name, family, kind` order
    pub fn values<'a>(&'a self, kind: &'a str) -> [&'a str; 3] {
        [self.name.as_str(), self.family.as_str(), kind]
    }
}

/// Runtime parameters derived from a definition
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub labels: MonitorLabels,
    /// Definition without `username`/`password`, safe to log
    pub redacted: serde_json::Value,
    pub level: LogLevel,
    pub timeout: Duration,
}

impl Descriptor {
    pub fn normalize(name: &str, definition: &MonitorDefinition) -> Self {
        Self {
            labels: MonitorLabels::new(name, definition.family.as_deref()),
            redacted: redact(definition),
            level: LogLevel::for_success(definition.level.as_deref()),
            timeout: effective_timeout(definition.timeout.as_ref()),
        }
    }
}

/// Serialized copy of a definition with credentials removed
pub fn redact(definition: &MonitorDefinition) -> serde_json::Value {
    let mut value = serde_json::to_value(definition).unwrap_or(serde_json::Value::Null);
    if let Some(fields) = value.as_object_mut() {
        fields.remove("username");
        fields.remove("password");
    }
    value
}

fn effective_timeout(raw: Option<&Scalar>) -> Duration {
    raw.and_then(Scalar::as_f64)
        .filter(|seconds| *seconds > 0.0)
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// What a monitor does each cycle
#[derive(Debug, Clone)]
pub enum Check {
    Tcp(TcpTarget),
    Http(HttpCheck),
    Invalid(ConfigFailure),
}

impl Check {
    /// Classify a named definition by its declared type
    pub fn classify(name: &str, definition: &MonitorDefinition) -> Self {
        let kind = definition
            .kind
            .as_deref()
            .map(str::trim)
            .filter(|kind| !kind.is_empty());

        let check = match kind {
            Some("tcp") => TcpTarget::from_url(definition.url.as_deref()).map(Check::Tcp),
            Some("http") => HttpCheck::from_definition(definition).map(Check::Http),
            other => Err(ConfigFailure::UnknownType {
                name: name.to_string(),
                kind: other.unwrap_or("undefined").to_string(),
            }),
        };

        check.unwrap_or_else(Check::Invalid)
    }

    /// Only HTTP monitors publish a duration gauge
    pub fn records_duration(&self) -> bool {
        matches!(self, Check::Http(_))
    }
}

/// A normalized, named monitor ready to be scheduled
#[derive(Debug, Clone)]
pub struct Monitor {
    pub name: String,
    pub descriptor: Descriptor,
    pub check: Check,
}

impl Monitor {
    /// Normalize a definition. Definitions without a name yield `None`:
    /// they get no metrics and no log events.
    pub fn from_definition(definition: &MonitorDefinition) -> Option<Self> {
        let name = definition.declared_name()?;

        Some(Self {
            name: name.to_string(),
            descriptor: Descriptor::normalize(name, definition),
            check: Check::classify(name, definition),
        })
    }

    pub fn labels(&self) -> &MonitorLabels {
        &self.descriptor.labels
    }
}
