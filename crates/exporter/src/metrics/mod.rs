use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use prometheus::{GaugeVec, Opts, Registry, TextEncoder};

pub mod catalog;

use catalog::{MetricDef, CATALOG};

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// One exported value: metric name, label pairs in schema order, gauge value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: &'static str,
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

/// Latest value per (metric name, label values), backed by a private prometheus registry.
///
/// Values are never removed: a source that stops answering leaves its last value in
/// place. Gauges are only created on first write, so metric groups that are never
/// written do not show up in the exposition at all.
pub struct MetricStore {
    registry: Registry,
    gauges: HashMap<&'static str, (&'static MetricDef, GaugeVec)>,
    live: RwLock<BTreeSet<(&'static str, Vec<String>)>>,
}

impl MetricStore {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let mut gauges = HashMap::with_capacity(CATALOG.len());
        for def in CATALOG {
            let gauge = GaugeVec::new(Opts::new(def.name, def.help), def.labels)?;
            registry.register(Box::new(gauge.clone()))?;
            gauges.insert(def.name, (def, gauge));
        }

        Ok(Self {
            registry,
            gauges,
            live: RwLock::new(BTreeSet::new()),
        })
    }

    /// Overwrites the value for `labels`, which must follow the metric's label schema.
    pub fn set(&self, name: &str, labels: &[&str], value: f64) -> Result<(), MetricsError> {
        let (def, gauge) = self
            .gauges
            .get(name)
            .ok_or_else(|| MetricsError::UnknownMetric(name.to_string()))?;
        gauge.get_metric_with_label_values(labels)?.set(value);
        self.track(def.name, labels);
        Ok(())
    }

    fn track(&self, name: &'static str, labels: &[&str]) {
        let key = (name, labels.iter().map(|l| l.to_string()).collect::<Vec<_>>());
        let known = self
            .live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key);
        if !known {
            self.live
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key);
        }
    }

    /// Every live sample, ordered by metric name then label values.
    ///
    /// The key set is captured when called; values are read as the iterator advances.
    pub fn samples(&self) -> impl Iterator<Item = MetricSample> + '_ {
        let keys: Vec<(&'static str, Vec<String>)> = self
            .live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();

        keys.into_iter().filter_map(move |(name, values)| {
            let (def, gauge) = self.gauges.get(name)?;
            let refs: Vec<&str> = values.iter().map(String::as_str).collect();
            let value = gauge.get_metric_with_label_values(&refs).ok()?.get();
            Some(MetricSample {
                name,
                labels: def.labels.iter().copied().zip(values).collect(),
                value,
            })
        })
    }

    pub fn value(&self, name: &str, labels: &[&str]) -> Option<f64> {
        self.samples()
            .find(|sample| {
                sample.name == name
                    && sample
                        .labels
                        .iter()
                        .map(|(_, v)| v.as_str())
                        .eq(labels.iter().copied())
            })
            .map(|sample| sample.value)
    }

    pub fn export_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}
