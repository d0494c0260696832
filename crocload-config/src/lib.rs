//! Domain-driven configuration management for crocload
//!
//! Configuration is split by functional domain (load shape, HTTP client,
//! logging, scenario identity), loaded once from YAML and/or environment
//! variables, validated, and then treated as immutable for the whole run.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    http::HttpConfig,
    load::{CloudConfig, LoadConfig, LoadZoneShare, Stage},
    logging::{LogFormat, LogLevel, LoggingConfig},
    scenario::ScenarioConfig,
    CrocloadConfig,
};

// Re-export utilities
pub use domains::utils::duration_secs;
