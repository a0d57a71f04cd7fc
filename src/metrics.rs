use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::Result;

/// Pipeline statuses that get their own `status` series.
pub const TRACKED_STATUSES: [&str; 3] = ["success", "failed", "running"];

pub const TIME_SINCE_LAST_RUN: &str = "gitlab_ci_pipeline_time_since_last_run_seconds";
pub const LAST_RUN_DURATION: &str = "gitlab_ci_pipeline_last_run_duration_seconds";
pub const RUN_COUNT: &str = "gitlab_ci_pipeline_run_count";
pub const STATUS: &str = "gitlab_ci_pipeline_status";

/// Process-wide store of the exported pipeline series.
///
/// Each family keeps its children in a read-mostly map and every child is
/// an atomic cell, so writers on different `(project, ref)` pairs never wait
/// on each other and writers on the same series are serialized. Series only
/// come into existence on their first write and are never removed.
pub struct MetricStore {
    registry: Registry,
    time_since_last_run: GaugeVec,
    last_run_duration: GaugeVec,
    run_count: IntCounterVec,
    status: GaugeVec,
}

impl MetricStore {
    /// Create the four metric families and register them with a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a family has an invalid name or is registered twice.
    pub fn new() -> Result<Self> {
        let time_since_last_run = GaugeVec::new(
            Opts::new(
                TIME_SINCE_LAST_RUN,
                "Elapsed time since most recent GitLab CI pipeline run.",
            ),
            &["project", "ref"],
        )?;

        let last_run_duration = GaugeVec::new(
            Opts::new(LAST_RUN_DURATION, "Duration of last pipeline run"),
            &["project", "ref"],
        )?;

        let run_count = IntCounterVec::new(
            Opts::new(RUN_COUNT, "GitLab CI pipeline run count"),
            &["project", "ref"],
        )?;

        let status = GaugeVec::new(
            Opts::new(STATUS, "GitLab CI pipeline current status"),
            &["project", "ref", "status"],
        )?;

        let registry = Registry::new();
        registry.register(Box::new(time_since_last_run.clone()))?;
        registry.register(Box::new(last_run_duration.clone()))?;
        registry.register(Box::new(run_count.clone()))?;
        registry.register(Box::new(status.clone()))?;

        Ok(Self {
            registry,
            time_since_last_run,
            last_run_duration,
            run_count,
            status,
        })
    }

    pub fn set_time_since_last_run(&self, project: &str, ref_: &str, seconds: f64) {
        self.time_since_last_run
            .with_label_values(&[project, ref_])
            .set(seconds);
    }

    pub fn set_last_run_duration(&self, project: &str, ref_: &str, seconds: f64) {
        self.last_run_duration
            .with_label_values(&[project, ref_])
            .set(seconds);
    }

    pub fn inc_run_count(&self, project: &str, ref_: &str) {
        self.run_count.with_label_values(&[project, ref_]).inc();
    }

    pub fn set_status(&self, project: &str, ref_: &str, status: &str, value: f64) {
        self.status
            .with_label_values(&[project, ref_, status])
            .set(value);
    }

    /// Render every series in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder rejects a metric family.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;

        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
impl MetricStore {
    /// Current value of one series, or `None` if it was never written.
    ///
    /// Reads from a gathered snapshot, so unlike `with_label_values` it
    /// never creates the series as a side effect.
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == name)
            .and_then(|family| {
                let kind = family.get_field_type();
                family
                    .get_metric()
                    .iter()
                    .find(|metric| labels_match(metric, labels))
                    .map(|metric| match kind {
                        prometheus::proto::MetricType::COUNTER => metric.get_counter().get_value(),
                        _ => metric.get_gauge().get_value(),
                    })
            })
    }

    /// Number of series currently present in a family.
    pub fn series_count(&self, name: &str) -> usize {
        self.registry
            .gather()
            .iter()
            .find(|family| family.get_name() == name)
            .map_or(0, |family| family.get_metric().len())
    }
}

#[cfg(test)]
fn labels_match(metric: &prometheus::proto::Metric, labels: &[(&str, &str)]) -> bool {
    let pairs = metric.get_label();
    pairs.len() == labels.len()
        && labels.iter().all(|(name, value)| {
            pairs
                .iter()
                .any(|pair| pair.get_name() == *name && pair.get_value() == *value)
        })
}
