//! Structured monitor events
//!
//! Every evaluation produces exactly one [`MonitorEvent`]. Where it ends up
//! is the business of an [`EventSink`]; the agent uses [`TracingSink`].

use crate::descriptor::{LogLevel, Monitor};
use crate::outcome::{CheckOutcome, CheckStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// One structured log record for one monitor evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorEvent {
    #[serde(skip)]
    pub level: LogLevel,
    pub status: CheckStatus,
    #[serde(rename = "type")]
    pub event_type: &'static str,
    /// Evaluation start, RFC 3339
    pub time: String,
    pub message: String,
    /// Credential-free copy of the monitor definition
    pub monitor: serde_json::Value,
    pub name: String,
    pub family: String,
    /// Measured duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MonitorEvent {
    pub const TYPE: &'static str = "monitor";

    /// Successful checks log at the monitor's own level, all others at ERROR
    pub fn from_outcome(monitor: &Monitor, outcome: &CheckOutcome, time: DateTime<Utc>) -> Self {
        let level = if outcome.is_healthy() {
            monitor.descriptor.level
        } else {
            LogLevel::Error
        };

        Self {
            level,
            status: outcome.status(),
            event_type: Self::TYPE,
            time: time.to_rfc3339_opts(SecondsFormat::Micros, true),
            message: outcome.message(),
            monitor: monitor.descriptor.redacted.clone(),
            name: monitor.labels().name.clone(),
            family: monitor.labels().family.clone(),
            duration: outcome.elapsed().map(|elapsed| elapsed.as_secs_f64()),
            error: outcome.error(),
        }
    }
}

/// Destination of monitor events
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &MonitorEvent);
}

/// Sink that turns events into `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! monitor_event {
    ($level:expr, $event:expr) => {
        tracing::event!(
            target: "imalive::monitor",
            $level,
            status = %$event.status,
            "type" = $event.event_type,
            time = %$event.time,
            monitor = %$event.monitor,
            name = %$event.name,
            family = %$event.family,
            duration = $event.duration,
            error = $event.error.as_deref(),
            "{}",
            $event.message
        )
    };
}

impl EventSink for TracingSink {
    fn emit(&self, event: &MonitorEvent) {
        match event.level {
            LogLevel::Debug => monitor_event!(tracing::Level::DEBUG, event),
            LogLevel::Info => monitor_event!(tracing::Level::INFO, event),
            LogLevel::Error => monitor_event!(tracing::Level::ERROR, event),
        }
    }
}
