//! Prometheus gauges for monitor results

use crate::descriptor::MonitorLabels;
use crate::error::{MonitorError, Result};
use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::warn;

/// Label dimensions of every monitor gauge
pub const LABEL_NAMES: [&str; 3] = ["name", "family", "kind"];

/// Metric registry owned by the agent
///
/// Cloning is cheap and every clone shares the same underlying registry.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Create and register a labelled gauge
    pub fn create_gauge(&self, name: &str, help: &str, label_names: &[&str]) -> Result<GaugeVec> {
        let gauge = GaugeVec::new(Opts::new(name, help), label_names).map_err(|e| {
            MonitorError::Metrics {
                message: format!("Failed to create {} metric: {}", name, e),
            }
        })?;

        self.registry
            .register(Box::new(gauge.clone()))
            .map_err(|e| MonitorError::Metrics {
                message: format!("Failed to register {} metric: {}", name, e),
            })?;

        Ok(gauge)
    }

    /// Set one sample of a gauge. A label cardinality mismatch is logged and
    /// the sample dropped.
    pub fn set_gauge(gauge: &GaugeVec, value: f64, label_values: &[&str]) {
        match gauge.get_metric_with_label_values(label_values) {
            Ok(sample) => sample.set(value),
            Err(e) => warn!(error = %e, "Dropping gauge sample"),
        }
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| MonitorError::Serialization {
            message: e.to_string(),
        })
    }
}

/// Metric name for one monitor: `monitor_<name>_<suffix>` with every
/// character outside `[a-zA-Z0-9_]` replaced by `_`
pub fn metric_name(monitor_name: &str, suffix: &str) -> String {
    let name: String = monitor_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("monitor_{}_{}", name, suffix)
}

/// The result and duration gauges of one monitor
#[derive(Clone)]
pub struct MetricHandles {
    pub result: GaugeVec,
    pub duration: GaugeVec,
}

impl MetricHandles {
    /// Register both gauges of a monitor; fails if the names are taken
    pub fn register(registry: &MetricsRegistry, monitor_name: &str) -> Result<Self> {
        let result = registry.create_gauge(
            &metric_name(monitor_name, "result"),
            &format!("monitor {} result", monitor_name),
            &LABEL_NAMES,
        )?;
        let duration = registry.create_gauge(
            &metric_name(monitor_name, "duration"),
            &format!("monitor {} duration", monitor_name),
            &LABEL_NAMES,
        )?;

        Ok(Self { result, duration })
    }

    pub fn record_result(&self, labels: &MonitorLabels, value: f64) {
        MetricsRegistry::set_gauge(&self.result, value, &labels.values("result"));
    }

    pub fn record_duration(&self, labels: &MonitorLabels, seconds: f64) {
        MetricsRegistry::set_gauge(&self.duration, seconds, &labels.values("duration"));
    }

    /// Last result written for these labels (0 when never set)
    pub fn result_value(&self, labels: &MonitorLabels) -> f64 {
        self.result.with_label_values(&labels.values("result")).get()
    }

    /// Last duration written for these labels, if any
    pub fn duration_value(&self, labels: &MonitorLabels) -> Option<f64> {
        let values = labels.values("duration");
        let wanted: Vec<(&str, &str)> = LABEL_NAMES.iter().copied().zip(values).collect();
        let recorded = self.duration.collect().iter().any(|family| {
            family.get_metric().iter().any(|metric| {
                metric
                    .get_label()
                    .iter()
                    .all(|pair| wanted.contains(&(pair.get_name(), pair.get_value())))
            })
        });

        recorded.then(|| self.duration.with_label_values(&values).get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> MonitorLabels {
        MonitorLabels::new("api", Some("web"))
    }

    #[test]
    fn test_metric_name_sanitized() {
        assert_eq!(metric_name("api", "result"), "monitor_api_result");
        assert_eq!(metric_name("my-api.v2", "duration"), "monitor_my_api_v2_duration");
    }

    #[test]
    fn test_register_and_set() {
        let registry = MetricsRegistry::new();
        let handles = MetricHandles::register(&registry, "api").unwrap();

        assert_eq!(handles.duration_value(&labels()), None);

        handles.record_result(&labels(), 1.0);
        handles.record_duration(&labels(), 0.25);
        assert_eq!(handles.result_value(&labels()), 1.0);
        assert_eq!(handles.duration_value(&labels()), Some(0.25));

        handles.record_result(&labels(), 0.0);
        assert_eq!(handles.result_value(&labels()), 0.0);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = MetricsRegistry::new();
        MetricHandles::register(&registry, "api").unwrap();
        assert!(MetricHandles::register(&registry, "api").is_err());
    }

    #[test]
    fn test_render_text_exposition() {
        let registry = MetricsRegistry::new();
        let handles = MetricHandles::register(&registry, "api").unwrap();
        handles.record_result(&labels(), 1.0);

        let text = registry.render().unwrap();
        assert!(text.contains("# HELP monitor_api_result monitor api result"));
        assert!(text.contains(r#"monitor_api_result{family="web",kind="result",name="api"} 1"#));
    }

    #[test]
    fn test_wrong_label_count_is_dropped() {
        let registry = MetricsRegistry::new();
        let gauge = registry.create_gauge("sample", "sample gauge", &LABEL_NAMES).unwrap();
        MetricsRegistry::set_gauge(&gauge, 1.0, &["only-one"]);
        assert!(registry.render().unwrap().is_empty());
    }
}
