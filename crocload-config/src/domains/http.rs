//! HTTP client configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How virtual users talk to the API under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Every scenario path is joined onto this
    pub base_url: String,
    /// Per request, counted until the body has been read
    #[serde(with = "crate::domains::utils::duration_secs")]
    pub timeout: Duration,
    pub max_redirects: u32,
    pub user_agent: String,
    pub verify_ssl: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://test-api.loadimpact.com".to_string(),
            timeout: Duration::from_secs(60),
            max_redirects: 10,
            user_agent: format!("crocload/{}", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
        }
    }
}

impl HttpConfig {
    /// Join a scenario path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_positive(self.timeout.as_millis(), "timeout", self.domain_name())?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.base_url, "https://test-api.loadimpact.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.starts_with("crocload/"));
        assert!(config.verify_ssl);
    }

    #[test]
    fn test_http_config_validation() {
        let mut config = HttpConfig::default();
        assert!(config.validate().is_ok());

        config.timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());

        config = HttpConfig::default();
        config.user_agent = String::new();
        assert!(config.validate().is_err());

        config = HttpConfig::default();
        config.base_url = "not-a-url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_joining() {
        let mut config = HttpConfig::default();
        assert_eq!(
            config.url("/my/crocodiles/"),
            "https://test-api.loadimpact.com/my/crocodiles/"
        );

        config.base_url = "http://localhost:8080/".to_string();
        assert_eq!(
            config.url("public/crocodiles/1/"),
            "http://localhost:8080/public/crocodiles/1/"
        );
    }
}
