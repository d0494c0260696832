//! Check tallies

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Pass/fail counts of one named check within one group path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// `""` at the top level, `::Name` or `::Outer::Inner` inside groups
    pub group: String,
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckResult {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    pub fn all_passed(&self) -> bool {
        self.fails == 0
    }
}

/// Tallies kept in the order checks were first seen
#[derive(Debug, Default)]
pub struct CheckRegistry {
    results: Mutex<Vec<CheckResult>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, group: &str, name: &str, passed: bool) {
        let mut results = self.results.lock();
        let index = match results
            .iter()
            .position(|r| r.group == group && r.name == name)
        {
            Some(index) => index,
            None => {
                results.push(CheckResult {
                    group: group.to_string(),
                    name: name.to_string(),
                    passes: 0,
                    fails: 0,
                });
                results.len() - 1
            }
        };

        let entry = &mut results[index];
        if passed {
            entry.passes += 1;
        } else {
            entry.fails += 1;
        }
    }

    pub fn snapshot(&self) -> Vec<CheckResult> {
        self.results.lock().clone()
    }

    pub fn get(&self, group: &str, name: &str) -> Option<CheckResult> {
        self.results
            .lock()
            .iter()
            .find(|r| r.group == group && r.name == name)
            .cloned()
    }
}
