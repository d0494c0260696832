//! End-of-run report

use crate::checks::CheckResult;
use crate::error::RunnerResult;
use crate::metrics::{self, MetricKind, MetricsRegistry, Tags, TrendStats};
use crate::thresholds::ThresholdResult;
use chrono::{DateTime, Utc};
use colored::Colorize;
use crocload_config::LoadZoneShare;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Aggregate of one metric over the whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricSummary {
    Trend(TrendStats),
    Counter { count: f64, rate: f64 },
    Rate { rate: f64, passes: u64, fails: u64 },
}

impl MetricSummary {
    /// `None` for unknown metrics or when there is nothing to aggregate
    pub fn collect(metric: &str, values: &[f64], elapsed: Duration) -> Option<Self> {
        match MetricKind::of(metric)? {
            MetricKind::Trend => TrendStats::from_values(values).map(MetricSummary::Trend),
            MetricKind::Counter => {
                let count: f64 = values.iter().sum();
                let secs = elapsed.as_secs_f64();
                Some(MetricSummary::Counter {
                    count,
                    rate: if secs > 0.0 { count / secs } else { 0.0 },
                })
            }
            MetricKind::Rate => {
                let passes = values.iter().filter(|v| **v != 0.0).count() as u64;
                Some(MetricSummary::Rate {
                    rate: metrics::rate(values)?,
                    passes,
                    fails: values.len() as u64 - passes,
                })
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            MetricSummary::Trend(s) => format!(
                "avg={:.2}ms min={:.2}ms med={:.2}ms max={:.2}ms p(90)={:.2}ms p(95)={:.2}ms",
                s.avg, s.min, s.med, s.max, s.p90, s.p95
            ),
            MetricSummary::Counter { count, rate } => format!("{} {:.2}/s", count, rate),
            MetricSummary::Rate { rate, passes, fails } => {
                format!("{:.2}% ({} of {})", rate * 100.0, passes, passes + fails)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    /// Declared load-zone shares; informational only
    pub distribution: BTreeMap<String, LoadZoneShare>,
    pub started_at: DateTime<Utc>,
    #[serde(with = "crocload_config::duration_secs")]
    pub duration: Duration,
    pub vus_max: u32,
    pub iterations: u64,
    pub iterations_interrupted: u64,
    /// Whether an external stop request cut the schedule short
    pub stopped_early: bool,
    pub metrics: BTreeMap<String, MetricSummary>,
    pub checks: Vec<CheckResult>,
    pub thresholds: Vec<ThresholdResult>,
}

impl RunSummary {
    /// Aggregate every metric present in `registry`
    pub fn collect_metrics(
        registry: &MetricsRegistry,
        elapsed: Duration,
    ) -> BTreeMap<String, MetricSummary> {
        registry
            .metric_names()
            .into_iter()
            .filter_map(|name| {
                let values = registry.values(&name, &Tags::new());
                MetricSummary::collect(&name, &values, elapsed).map(|summary| (name, summary))
            })
            .collect()
    }

    pub fn thresholds_passed(&self) -> bool {
        self.thresholds.iter().all(|t| t.passed)
    }

    pub fn failed_thresholds(&self) -> impl Iterator<Item = &ThresholdResult> {
        self.thresholds.iter().filter(|t| !t.passed)
    }

    pub fn to_json(&self) -> RunnerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn export_json(&self, path: &Path) -> RunnerResult<()> {
        std::fs::write(path, self.to_json()?)?;
        info!("Summary written to {}", path.display());
        Ok(())
    }

    /// Human-readable report
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("\n  {} {}\n", "test:".bold(), self.name));
        if let Some(project_id) = self.project_id {
            out.push_str(&format!("  project: {}\n", project_id));
        }
        for (label, share) in &self.distribution {
            out.push_str(&format!(
                "  zone: {} ({}) {}%\n",
                label, share.load_zone, share.percent
            ));
        }
        out.push_str(&format!(
            "  started: {}  duration: {:.1}s  vus_max: {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.duration.as_secs_f64(),
            self.vus_max
        ));
        if self.stopped_early {
            out.push_str(&format!("  {}\n", "run stopped before the schedule ended".yellow()));
        }

        let mut current_group: Option<&str> = None;
        if !self.checks.is_empty() {
            out.push('\n');
        }
        for check in &self.checks {
            if current_group != Some(check.group.as_str()) {
                current_group = Some(check.group.as_str());
                if !check.group.is_empty() {
                    out.push_str(&format!("  █ {}\n", check.group.trim_start_matches("::")));
                }
            }
            if check.all_passed() {
                out.push_str(&format!("    {} {}\n", "✓".green(), check.name));
            } else {
                out.push_str(&format!("    {} {}\n", "✗".red(), check.name));
                out.push_str(&format!(
                    "      ↳ {:.0}% ✓ {} / ✗ {}\n",
                    check.passes as f64 * 100.0 / check.total() as f64,
                    check.passes,
                    check.fails
                ));
            }
        }

        out.push('\n');
        for (name, summary) in &self.metrics {
            out.push_str(&format!("  {:.<28} {}\n", name, summary.describe()));
        }
        out.push_str(&format!(
            "  {:.<28} {} complete, {} interrupted\n",
            "iterations (run)", self.iterations, self.iterations_interrupted
        ));

        if !self.thresholds.is_empty() {
            out.push_str(&format!("\n  {}\n", "thresholds".bold()));
        }
        for t in &self.thresholds {
            let observed = t
                .observed
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "no data".to_string());
            let mark = if t.passed { "✓".green() } else { "✗".red() };
            out.push_str(&format!(
                "    {} {} {} (observed {})\n",
                mark, t.selector, t.expression, observed
            ));
        }

        out
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}
