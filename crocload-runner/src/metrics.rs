//! Sample collection and aggregation

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const HTTP_REQ_DURATION: &str = "http_req_duration";
pub const HTTP_REQS: &str = "http_reqs";
pub const HTTP_REQ_FAILED: &str = "http_req_failed";
pub const ITERATION_DURATION: &str = "iteration_duration";
pub const ITERATIONS: &str = "iterations";
pub const CHECKS: &str = "checks";

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Distribution of values (durations in milliseconds)
    Trend,
    /// Monotonic sum
    Counter,
    /// Fraction of non-zero samples
    Rate,
}

impl MetricKind {
    /// Kind of a built-in metric
    pub fn of(metric: &str) -> Option<MetricKind> {
        match metric {
            HTTP_REQ_DURATION | ITERATION_DURATION => Some(MetricKind::Trend),
            HTTP_REQS | ITERATIONS => Some(MetricKind::Counter),
            HTTP_REQ_FAILED | CHECKS => Some(MetricKind::Rate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub metric: String,
    pub value: f64,
    pub tags: Tags,
}

impl Sample {
    pub fn new(metric: impl Into<String>, value: f64, tags: Tags) -> Self {
        Self {
            metric: metric.into(),
            value,
            tags,
        }
    }

    /// Whether every `filter` tag is present with the same value
    pub fn matches(&self, metric: &str, filter: &Tags) -> bool {
        self.metric == metric
            && filter
                .iter()
                .all(|(k, v)| self.tags.get(k).is_some_and(|tv| tv == v))
    }
}

/// Thread-safe sample store shared by every VU
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    samples: Mutex<Vec<Sample>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, sample: Sample) {
        self.samples.lock().push(sample);
    }

    pub fn add_all(&self, samples: impl IntoIterator<Item = Sample>) {
        self.samples.lock().extend(samples);
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Values of `metric` whose tags include all of `filter`
    pub fn values(&self, metric: &str, filter: &Tags) -> Vec<f64> {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.matches(metric, filter))
            .map(|s| s.value)
            .collect()
    }

    /// Names of every metric that has at least one sample
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .samples
            .lock()
            .iter()
            .map(|s| s.metric.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Summary statistics over a trend's values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendStats {
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
}

impl TrendStats {
    /// `None` when there are no values
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted(values);
        Some(Self {
            count: sorted.len(),
            avg: sorted.iter().sum::<f64>() / sorted.len() as f64,
            min: sorted[0],
            med: percentile_sorted(&sorted, 50.0),
            max: sorted[sorted.len() - 1],
            p90: percentile_sorted(&sorted, 90.0),
            p95: percentile_sorted(&sorted, 95.0),
        })
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile with linear interpolation between closest ranks
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(percentile_sorted(&sorted(values), p))
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Fraction of non-zero values
pub fn rate(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let hits = values.iter().filter(|v| **v != 0.0).count();
    Some(hits as f64 / values.len() as f64)
}
