//! Domain-specific configuration modules

pub mod http;
pub mod load;
pub mod logging;
pub mod scenario;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Everything a run reads, one section per domain
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrocloadConfig {
    pub load: load::LoadConfig,
    pub http: http::HttpConfig,
    pub logging: logging::LoggingConfig,
    pub scenario: scenario::ScenarioConfig,
}

impl CrocloadConfig {
    /// Stops at the first domain that fails
    pub fn validate_all(&self) -> ConfigResult<()> {
        let domains: [&dyn Validatable; 4] =
            [&self.load, &self.http, &self.logging, &self.scenario];
        domains.iter().try_for_each(|domain| domain.validate())
    }

    /// Commented YAML with every default filled in
    pub fn generate_sample() -> String {
        let body = serde_yaml::to_string(&CrocloadConfig::default())
            .unwrap_or_else(|e| format!("# unable to render defaults: {}\n", e));
        format!(
            "# crocload configuration\n# Environment overrides use the CROCLOAD_ prefix; PROJECT_ID is also read.\n{}",
            body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CrocloadConfig::default().validate_all().is_ok());
    }

    #[test]
    fn test_sample_parses_back() {
        let sample = CrocloadConfig::generate_sample();
        let parsed: CrocloadConfig = serde_yaml::from_str(&sample).unwrap();
        assert!(parsed.validate_all().is_ok());
        assert_eq!(parsed.load.stages, CrocloadConfig::default().load.stages);
    }
}
