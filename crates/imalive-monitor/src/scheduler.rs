//! Polling scheduler
//!
//! Owns the monitors and their gauges, and evaluates them one after the
//! other, in declared order, once per cycle. Cycles are separated by a fixed
//! wait. The whole loop runs on a single background task.

use crate::config::AgentConfig;
use crate::descriptor::Monitor;
use crate::error::Result;
use crate::evaluator::MonitorEvaluator;
use crate::events::EventSink;
use crate::metrics::{MetricHandles, MetricsRegistry};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, info_span, Instrument};

/// Wait between cycles when none is configured
pub const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// A monitor together with the gauges it writes
pub struct ScheduledMonitor {
    pub monitor: Monitor,
    pub handles: MetricHandles,
}

pub struct MonitorScheduler {
    monitors: Vec<ScheduledMonitor>,
    evaluator: MonitorEvaluator,
    wait: Duration,
    cycles: u64,
}

impl MonitorScheduler {
    /// Normalize every named monitor and register its gauges. Monitors
    /// without a name are left out entirely.
    pub fn new(
        config: &AgentConfig,
        registry: &MetricsRegistry,
        sink: Arc<dyn EventSink>,
        wait: Duration,
    ) -> Result<Self> {
        config.validate()?;

        let mut monitors = Vec::new();
        for monitor in config.named_monitors().filter_map(Monitor::from_definition) {
            let handles = MetricHandles::register(registry, &monitor.name)?;
            monitors.push(ScheduledMonitor { monitor, handles });
        }

        let skipped = config.monitors.len() - monitors.len();
        info!(
            monitors = monitors.len(),
            skipped,
            wait_secs = wait.as_secs_f64(),
            "Monitors loaded"
        );

        Ok(Self {
            monitors,
            evaluator: MonitorEvaluator::new(sink),
            wait,
            cycles: 0,
        })
    }

    pub fn monitors(&self) -> &[ScheduledMonitor] {
        &self.monitors
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Gauges of a monitor, by name
    pub fn handles(&self, name: &str) -> Option<&MetricHandles> {
        self.monitors
            .iter()
            .find(|scheduled| scheduled.monitor.name == name)
            .map(|scheduled| &scheduled.handles)
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Completed cycles so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Evaluate every monitor once, sequentially, inside one span. A panic
    /// while evaluating a monitor is recorded as a failed check for that
    /// monitor only.
    pub async fn run_cycle(&mut self) {
        let span = info_span!(
            "imalive_monitors",
            cycle = self.cycles + 1,
            monitors = self.monitors.len()
        );
        let monitors = &self.monitors;
        let evaluator = &self.evaluator;

        async move {
            for scheduled in monitors {
                let evaluation = evaluator.evaluate(&scheduled.monitor, &scheduled.handles);
                if let Err(panic) = AssertUnwindSafe(evaluation).catch_unwind().await {
                    evaluator.report_panic(
                        &scheduled.monitor,
                        &scheduled.handles,
                        &panic_message(panic.as_ref()),
                    );
                }
            }
        }
        .instrument(span)
        .await;

        self.cycles += 1;
    }

    /// Loop forever: one cycle, then the fixed wait
    pub async fn run(mut self) {
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.wait).await;
        }
    }

    /// Start the loop on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let panic: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(panic.as_ref()), "boom");

        let panic: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(panic.as_ref()), "bang");

        let panic: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(panic.as_ref()), "unknown panic");
    }
}
