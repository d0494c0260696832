//! Ramp schedule: how many VUs should be active at a point in the run

use crocload_config::{LoadConfig, Stage};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RampSchedule {
    start_vus: u32,
    stages: Vec<Stage>,
}

impl RampSchedule {
    pub fn new(start_vus: u32, stages: Vec<Stage>) -> Self {
        Self { start_vus, stages }
    }

    pub fn from_config(config: &LoadConfig) -> Self {
        Self::new(config.start_vus, config.stages.clone())
    }

    pub fn stages_len(&self) -> usize {
        self.stages.len()
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Highest concurrency reached anywhere in the schedule
    pub fn max_vus(&self) -> u32 {
        self.stages
            .iter()
            .map(|s| s.target)
            .fold(self.start_vus, u32::max)
    }

    /// Target VU count `elapsed` into the run.
    ///
    /// Each stage moves linearly from the previous target (initially
    /// `start_vus`) to its own target. Zero-length stages jump straight to
    /// their target. Past the end the last target is held.
    pub fn target_at(&self, elapsed: Duration) -> u32 {
        let mut from = self.start_vus;
        let mut offset = Duration::ZERO;

        for stage in &self.stages {
            let end = offset + stage.duration;
            if elapsed < end {
                let progress =
                    (elapsed - offset).as_secs_f64() / stage.duration.as_secs_f64();
                let delta = f64::from(stage.target) - f64::from(from);
                return (f64::from(from) + delta * progress).round() as u32;
            }
            from = stage.target;
            offset = end;
        }

        from
    }
}
