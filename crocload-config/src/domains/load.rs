//! Load shape configuration: ramp stages, thresholds and cloud metadata

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Load shape configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Virtual users active when the first stage begins
    #[serde(default = "default_start_vus")]
    pub start_vus: u32,

    /// Ordered ramp stages
    #[serde(default = "default_stages")]
    pub stages: Vec<Stage>,

    /// Metric selector -> list of threshold expressions
    #[serde(default = "default_thresholds")]
    pub thresholds: BTreeMap<String, Vec<String>>,

    /// Time a retired VU is given to finish its in-flight iteration
    #[serde(with = "humantime_serde", default = "default_graceful")]
    pub graceful_ramp_down: Duration,

    /// Time all VUs are given to finish once the last stage ends
    #[serde(with = "humantime_serde", default = "default_graceful")]
    pub graceful_stop: Duration,

    /// Cloud execution metadata
    #[serde(default)]
    pub cloud: CloudConfig,
}

/// One ramp stage: reach `target` VUs over `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }
}

/// Metadata describing a cloud run. Carried with the configuration and
/// reported in the run summary; this tool never distributes load itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Test name
    #[serde(default = "default_cloud_name")]
    pub name: String,

    /// Numeric project identifier, usually supplied through `PROJECT_ID`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,

    /// Label -> load zone share
    #[serde(default = "default_distribution")]
    pub distribution: BTreeMap<String, LoadZoneShare>,
}

/// Share of virtual users assigned to one load zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadZoneShare {
    pub load_zone: String,
    pub percent: u32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            start_vus: default_start_vus(),
            stages: default_stages(),
            thresholds: default_thresholds(),
            graceful_ramp_down: default_graceful(),
            graceful_stop: default_graceful(),
            cloud: CloudConfig::default(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            name: default_cloud_name(),
            project_id: None,
            distribution: default_distribution(),
        }
    }
}

impl LoadConfig {
    /// Total scheduled time across all stages
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Highest VU count any stage asks for
    pub fn max_vus(&self) -> u32 {
        self.stages
            .iter()
            .map(|s| s.target)
            .chain(std::iter::once(self.start_vus))
            .max()
            .unwrap_or(0)
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.stages.is_empty() {
            return Err(self.validation_error("at least one stage must be configured"));
        }

        if self.total_duration().is_zero() {
            return Err(self.validation_error("stages must span a non-zero duration"));
        }

        for (selector, expressions) in &self.thresholds {
            validate_required_string(selector, "threshold metric", self.domain_name())?;
            if expressions.is_empty() {
                return Err(self.validation_error(format!(
                    "threshold '{}' has no expressions",
                    selector
                )));
            }
        }

        self.cloud.validate()
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

impl Validatable for CloudConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (label, share) in &self.distribution {
            validate_required_string(&share.load_zone, "load_zone", self.domain_name())?;
            if share.percent > 100 {
                tracing::warn!("Load zone '{}' asks for {}%", label, share.percent);
            }
        }

        // Apportioning is the cloud's concern; an oversubscribed split is only reported
        let total: u32 = self.distribution.values().map(|s| s.percent).sum();
        if total > 100 {
            tracing::warn!(
                "Load zone distribution sums to {}%, which exceeds 100%",
                total
            );
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load.cloud"
    }
}

// Default value functions
fn default_start_vus() -> u32 {
    1
}

fn default_stages() -> Vec<Stage> {
    vec![
        Stage::new(Duration::from_secs(10), 20),
        Stage::new(Duration::from_secs(10), 20),
        Stage::new(Duration::from_secs(10), 0),
    ]
}

fn default_thresholds() -> BTreeMap<String, Vec<String>> {
    let mut thresholds = BTreeMap::new();
    thresholds.insert(
        "http_req_duration".to_string(),
        vec!["p(95)<500".to_string(), "p(99)<1500".to_string()],
    );
    thresholds.insert(
        "http_req_duration{name:PublicCrocs}".to_string(),
        vec!["avg<400".to_string()],
    );
    thresholds.insert(
        "http_req_duration{name:Create}".to_string(),
        vec!["avg<600".to_string(), "max<1000".to_string()],
    );
    thresholds
}

fn default_graceful() -> Duration {
    Duration::from_secs(30)
}

fn default_cloud_name() -> String {
    "API Demo Test".to_string()
}

fn default_distribution() -> BTreeMap<String, LoadZoneShare> {
    let mut distribution = BTreeMap::new();
    distribution.insert(
        "Ashburn - US".to_string(),
        LoadZoneShare {
            load_zone: "amazon:us:ashburn".to_string(),
            percent: 50,
        },
    );
    distribution.insert(
        "Dublin - Ireland".to_string(),
        LoadZoneShare {
            load_zone: "amazon:ie:dublin".to_string(),
            percent: 50,
        },
    );
    distribution
}
