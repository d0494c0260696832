//! `crocload run`

use crate::cli::RunArgs;
use anyhow::{Context, Result};
use crocload_config::CrocloadConfig;
use crocload_http::{HttpConfig, HttpManager};
use crocload_runner::{Executor, ExecutorOptions};
use crocload_scenario::CrocodileScenario;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Exit status of a completed run with at least one failed threshold
const THRESHOLDS_FAILED_EXIT_CODE: u8 = 99;

/// Fold command-line overrides into the loaded configuration
fn apply_overrides(config: &mut CrocloadConfig, args: &RunArgs) -> Result<()> {
    if let Some(base_url) = &args.base_url {
        config.http.base_url = base_url.clone();
    }
    if let Some(project_id) = args.project_id {
        config.load.cloud.project_id = Some(project_id);
    }
    if args.no_thresholds {
        config.load.thresholds.clear();
    }
    config
        .validate_all()
        .context("Invalid configuration after applying command-line overrides")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C"),
        Err(e) => {
            warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}

pub async fn run_command(mut config: CrocloadConfig, args: RunArgs) -> Result<ExitCode> {
    apply_overrides(&mut config, &args)?;

    info!(
        "Running '{}' against {}",
        config.load.cloud.name, config.http.base_url
    );
    if let Some(project_id) = config.load.cloud.project_id {
        info!("Cloud project id: {}", project_id);
    }

    let client = HttpManager::with_config(HttpConfig::from(config.http.clone()))
        .context("Failed to build HTTP client")?;
    let executor = Executor::new(
        CrocodileScenario::from_config(&config),
        Arc::new(client),
        ExecutorOptions::from_config(&config.load),
    )
    .context("Invalid thresholds")?;

    let summary = executor
        .run_until(shutdown_signal())
        .await
        .context("Load test aborted")?;

    summary.print();
    if let Some(path) = &args.summary_export {
        summary
            .export_json(path)
            .with_context(|| format!("Failed to export summary to {}", path.display()))?;
    }

    if summary.thresholds_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        for failed in summary.failed_thresholds() {
            error!("Threshold {} {} crossed", failed.selector, failed.expression);
        }
        Ok(ExitCode::from(THRESHOLDS_FAILED_EXIT_CODE))
    }
}
