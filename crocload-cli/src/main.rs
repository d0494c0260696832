//! crocload CLI main entry point

use anyhow::{Context, Result};
use clap::Parser;
use crocload_config::LogLevel;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::info;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => {
            let mut config = commands::load_config(cli.config.as_deref())?;
            if let Some(level) = &cli.log_level {
                config.logging.level = LogLevel::from_str(level)
                    .map_err(|e| anyhow::anyhow!("Invalid --log-level: {}", e))?;
            }
            crocload_logging::init_logging_from_config(&config.logging)?;
            info!("crocload {} starting", env!("CARGO_PKG_VERSION"));

            commands::run_command(config, args).await
        }
        Some(Commands::Config { config_cmd }) => {
            crocload_logging::init_simple_tracing(cli.log_level.as_deref().unwrap_or("warn"))?;
            match config_cmd {
                ConfigCommands::Validate { config_file } => {
                    commands::handle_config_validate(&config_file)
                }
                ConfigCommands::Generate { output, force } => {
                    commands::handle_config_generate(&output, force)
                }
                ConfigCommands::Show { format } => {
                    commands::handle_config_show(cli.config.as_deref(), &format)
                }
            }?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}
