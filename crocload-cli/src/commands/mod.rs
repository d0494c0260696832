//! Command handlers

mod config;
mod run;

pub use config::{handle_config_generate, handle_config_show, handle_config_validate};
pub use run::run_command;

use anyhow::{Context, Result};
use crocload_config::{ConfigLoader, CrocloadConfig};
use std::path::Path;

/// Load configuration from a file, or from defaults plus environment
pub fn load_config(config_file: Option<&Path>) -> Result<CrocloadConfig> {
    let loader = ConfigLoader::new();
    match config_file {
        Some(path) => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}
