//! In-memory recorder for inspecting emitted metrics.

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use metrics_util::registry::{AtomicStorage, Registry};
use std::{
    fmt,
    sync::{Arc, atomic::Ordering},
};

/// A recorder that keeps every metric in memory and exposes snapshots.
///
/// Install it with [`metrics::with_local_recorder`] or
/// [`metrics::set_default_local_recorder`] to observe what a piece of code emits.
#[derive(Clone)]
pub struct CaptureRecorder {
    /// Registry for storing metrics
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl CaptureRecorder {
    /// Create a new, empty recorder
    pub fn new() -> Self {
        Self { registry: Arc::new(Registry::atomic()) }
    }

    /// Get a snapshot of the current metrics
    pub fn snapshot(&self) -> Vec<MetricSnapshot> {
        let mut snapshots = Vec::new();

        self.registry.visit_counters(|key, counter| {
            snapshots.push(MetricSnapshot::new(
                key,
                MetricValue::Counter(counter.load(Ordering::Acquire)),
            ));
        });

        self.registry.visit_gauges(|key, gauge| {
            snapshots.push(MetricSnapshot::new(
                key,
                MetricValue::Gauge(f64::from_bits(gauge.load(Ordering::Acquire))),
            ));
        });

        self.registry.visit_histograms(|key, histogram| {
            snapshots.push(MetricSnapshot::new(key, MetricValue::Histogram(histogram.data())));
        });

        snapshots
    }

    /// Value of the counter with exactly the given labels.
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        self.find(name, labels).and_then(|snapshot| match snapshot.value {
            MetricValue::Counter(value) => Some(value),
            _ => None,
        })
    }

    /// Sum of a counter across all label sets.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.snapshot()
            .into_iter()
            .filter(|snapshot| snapshot.name == name)
            .map(|snapshot| match snapshot.value {
                MetricValue::Counter(value) => value,
                _ => 0,
            })
            .sum()
    }

    /// Value of the gauge with exactly the given labels.
    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.find(name, labels).and_then(|snapshot| match snapshot.value {
            MetricValue::Gauge(value) => Some(value),
            _ => None,
        })
    }

    /// Samples recorded into the histogram with exactly the given labels.
    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Option<Vec<f64>> {
        self.find(name, labels).and_then(|snapshot| match snapshot.value {
            MetricValue::Histogram(values) => Some(values),
            _ => None,
        })
    }

    fn find(&self, name: &str, labels: &[(&str, &str)]) -> Option<MetricSnapshot> {
        self.snapshot().into_iter().find(|snapshot| snapshot.matches(name, labels))
    }
}

impl Default for CaptureRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CaptureRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureRecorder").finish_non_exhaustive()
    }
}

impl Recorder for CaptureRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |counter| Counter::from_arc(counter.clone()))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |gauge| Gauge::from_arc(gauge.clone()))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry
            .get_or_create_histogram(key, |histogram| Histogram::from_arc(histogram.clone()))
    }
}

/// A snapshot of a metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    /// Name of the metric
    pub name: String,
    /// Labels attached to the metric
    pub labels: Vec<(String, String)>,
    /// The metric value
    pub value: MetricValue,
}

impl MetricSnapshot {
    fn new(key: &Key, value: MetricValue) -> Self {
        Self {
            name: key.name().to_string(),
            labels: key
                .labels()
                .map(|label| (label.key().to_string(), label.value().to_string()))
                .collect(),
            value,
        }
    }

    fn matches(&self, name: &str, labels: &[(&str, &str)]) -> bool {
        self.name == name
            && self.labels.len() == labels.len()
            && labels.iter().all(|(k, v)| self.labels.iter().any(|(lk, lv)| lk == k && lv == v))
    }
}

/// Possible metric value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// A counter value
    Counter(u64),
    /// A gauge value
    Gauge(f64),
    /// Every sample recorded into a histogram
    Histogram(Vec<f64>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_all_kinds() {
        let recorder = CaptureRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("hits", "path" => "/a").increment(2);
            metrics::counter!("hits", "path" => "/a").increment(1);
            metrics::counter!("hits", "path" => "/b").increment(5);
            metrics::gauge!("level").set(1.5);
            metrics::histogram!("latency").record(0.25);
            metrics::histogram!("latency").record(0.5);
        });

        assert_eq!(recorder.counter("hits", &[("path", "/a")]), Some(3));
        assert_eq!(recorder.counter("hits", &[("path", "/c")]), None);
        assert_eq!(recorder.counter_total("hits"), 8);
        assert_eq!(recorder.gauge("level", &[]), Some(1.5));
        let mut latency = recorder.histogram("latency", &[]).unwrap();
        latency.sort_by(f64::total_cmp);
        assert_eq!(latency, vec![0.25, 0.5]);
    }

    #[test]
    fn test_label_match_is_exact() {
        let recorder = CaptureRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("hits", "path" => "/a", "status" => "ok").increment(1);
        });

        assert_eq!(recorder.counter("hits", &[("path", "/a")]), None);
        assert_eq!(recorder.counter("hits", &[("status", "ok"), ("path", "/a")]), Some(1));
    }
}
