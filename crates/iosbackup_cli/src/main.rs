//! `iosbackup` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, resolve configuration and start logging.
//! - Dispatch to the command handlers in [`commands`].

use anyhow::Context;
use clap::Parser;
use iosbackup_core::{init_logging, init_stderr_logging, ConfigOverrides, ExplorerConfig};

mod cli;
mod commands;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ExplorerConfig::resolve(ConfigOverrides {
        backup_root: cli.root.clone(),
        export_dir: None,
        mode: cli.mode,
        log_level: cli.log_level.clone(),
        log_dir: cli.log_dir.clone(),
    })?;
    start_logging(&config)?;
    commands::run(&cli, &config)
}

fn start_logging(config: &ExplorerConfig) -> anyhow::Result<()> {
    let Some(dir) = &config.log_dir else {
        return Ok(init_stderr_logging(config.log_level)?);
    };
    let dir = if dir.is_absolute() {
        dir.clone()
    } else {
        std::env::current_dir()
            .context("failed to read the working directory")?
            .join(dir)
    };
    let dir = dir
        .to_str()
        .with_context(|| format!("log directory is not valid UTF-8: {}", dir.display()))?;
    Ok(init_logging(config.log_level, dir)?)
}
