//! `crocload config ...`

use super::load_config;
use anyhow::{anyhow, Context, Result};
use crocload_config::CrocloadConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {}", config_file.display());

    match load_config(Some(config_file)) {
        Ok(config) => {
            println!("✅ Configuration file is valid");
            println!(
                "   {} stages over {:?}, up to {} VUs, {} threshold selectors",
                config.load.stages.len(),
                config.load.total_duration(),
                config.load.max_vus(),
                config.load.thresholds.len()
            );
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {:#}", e);
            error!("Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

pub fn handle_config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating configuration at: {}", output.display());

    if output.exists() && !force {
        return Err(anyhow!(
            "Output file already exists: {}. Use --force to overwrite.",
            output.display()
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, CrocloadConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("✅ Configuration generated at: {}", output.display());
    println!(
        "🔧 Validate with: crocload config validate --config-file {}",
        output.display()
    );
    Ok(())
}

pub fn handle_config_show(config_file: Option<&Path>, format: &str) -> Result<()> {
    let config = load_config(config_file)?;
    println!("{}", render_config(&config, format)?);
    Ok(())
}

const MASKED: &str = "********";

/// Serialise for display, with the account password masked
fn render_config(config: &CrocloadConfig, format: &str) -> Result<String> {
    let mut shown = config.clone();
    if !shown.scenario.password.is_empty() {
        shown.scenario.password = MASKED.to_string();
    }
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(&shown).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(&shown).context("Failed to serialize to JSON"),
        _ => Err(anyhow!(
            "Unknown output format: {}. Valid formats: yaml, json",
            format
        )),
    }
}
