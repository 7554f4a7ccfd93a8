//! imalive monitor engine
//!
//! Periodically probes configured HTTP and TCP targets, classifies each
//! result as healthy or not, and publishes it as Prometheus gauges plus one
//! structured log event per check.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod metrics;
pub mod outcome;
pub mod pattern;
pub mod probe;
pub mod scheduler;
pub mod telemetry;

// Re-export commonly used types
pub use config::{AgentConfig, HeaderDefinition, MonitorDefinition, Scalar};
pub use descriptor::{Check, Descriptor, LogLevel, Monitor, MonitorLabels};
pub use error::{MonitorError, Result};
pub use evaluator::MonitorEvaluator;
pub use events::{EventSink, MonitorEvent, TracingSink};
pub use metrics::{MetricHandles, MetricsRegistry};
pub use outcome::{CheckOutcome, CheckStatus, ConfigFailure, Failure, ProbeError};
pub use pattern::{status_matches, StatusPattern};
pub use scheduler::{MonitorScheduler, ScheduledMonitor};
pub use telemetry::{init_tracing, LogFormat};
