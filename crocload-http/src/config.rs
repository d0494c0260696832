//! Settings baked into the reqwest client when it is built

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client-side subset of the `http` configuration domain; the base URL stays
/// with the scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_redirects: u32,
    pub user_agent: String,
    /// `false` accepts self-signed certificates on local deployments
    pub verify_ssl: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        crocload_config::HttpConfig::default().into()
    }
}

impl From<crocload_config::HttpConfig> for HttpConfig {
    fn from(domain: crocload_config::HttpConfig) -> Self {
        let crocload_config::HttpConfig {
            timeout,
            max_redirects,
            user_agent,
            verify_ssl,
            ..
        } = domain;
        Self {
            timeout,
            max_redirects,
            user_agent,
            verify_ssl,
        }
    }
}
