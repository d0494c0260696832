//! Scenario identity and payload configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed values the crocodile scenario sends and asserts on
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Registration first name
    pub first_name: String,

    /// Registration last name
    pub last_name: String,

    /// Username used for registration and login
    pub username: String,

    /// Password used for registration and login
    pub password: String,

    /// Ids fetched by the public endpoints batch
    pub public_crocodile_ids: Vec<u32>,

    /// Every public crocodile must be strictly older than this
    pub minimum_age: u32,

    /// Prefix of created crocodile names; a random suffix is appended
    pub name_prefix: String,

    /// Sex code of created crocodiles
    pub sex: String,

    /// Date of birth of created crocodiles
    pub date_of_birth: String,

    /// Substring expected in the first listed crocodile's name
    pub listing_substring: String,

    /// Pause at the end of every iteration
    #[serde(with = "humantime_serde")]
    pub pacing: Duration,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            first_name: "Crocodile".to_string(),
            last_name: "Owner".to_string(),
            username: "robin.demo@example.com".to_string(),
            password: "superCroc2019".to_string(),
            public_crocodile_ids: vec![1, 2, 3, 4],
            minimum_age: 5,
            name_prefix: "Jerry".to_string(),
            sex: "M".to_string(),
            date_of_birth: "2001-01-01".to_string(),
            listing_substring: "Jerry".to_string(),
            pacing: Duration::from_secs(1),
        }
    }
}

impl Validatable for ScenarioConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.username, "username", self.domain_name())?;
        validate_required_string(&self.password, "password", self.domain_name())?;
        validate_required_string(&self.name_prefix, "name_prefix", self.domain_name())?;

        if self.public_crocodile_ids.is_empty() {
            return Err(self.validation_error("public_crocodile_ids cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenario"
    }
}
