//! Monitor evaluation: dispatch to the matching probe, then publish the
//! outcome as gauge updates plus one event

use crate::descriptor::{Check, Monitor};
use crate::events::{EventSink, MonitorEvent};
use crate::metrics::MetricHandles;
use crate::outcome::{CheckOutcome, Failure, ProbeError};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Evaluates monitors and reports their outcome
#[derive(Clone)]
pub struct MonitorEvaluator {
    sink: Arc<dyn EventSink>,
}

impl MonitorEvaluator {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Run one check of `monitor` and publish its outcome
    pub async fn evaluate(&self, monitor: &Monitor, handles: &MetricHandles) -> CheckOutcome {
        let started = Utc::now();
        let outcome = run_check(monitor).await;
        self.report(monitor, handles, &outcome, started);
        outcome
    }

    /// Record an evaluation that panicked as a failed check
    pub fn report_panic(&self, monitor: &Monitor, handles: &MetricHandles, reason: &str) {
        let outcome = CheckOutcome::unhealthy(Failure::Transport {
            error: ProbeError::Request(format!("evaluation panicked: {}", reason)),
            elapsed: None,
        });
        self.report(monitor, handles, &outcome, Utc::now());
    }

    fn report(
        &self,
        monitor: &Monitor,
        handles: &MetricHandles,
        outcome: &CheckOutcome,
        started: DateTime<Utc>,
    ) {
        let labels = monitor.labels();

        if monitor.check.records_duration() {
            if let Some(elapsed) = outcome.response_elapsed() {
                handles.record_duration(labels, elapsed.as_secs_f64());
            }
        }
        handles.record_result(labels, outcome.result_value());

        self.sink
            .emit(&MonitorEvent::from_outcome(monitor, outcome, started));
    }
}

/// Route a monitor to its probe. Invalid monitors fail without any I/O.
pub async fn run_check(monitor: &Monitor) -> CheckOutcome {
    let timeout = monitor.descriptor.timeout;
    match &monitor.check {
        Check::Tcp(target) => target.probe(timeout).await,
        Check::Http(check) => check.probe(timeout).await,
        Check::Invalid(failure) => CheckOutcome::unhealthy(failure.clone()),
    }
}
