//! imgdeck, a command-line shell for browsing folders of images.
//!
//! This binary parses arguments, loads the configuration and hands each
//! subcommand to [`commands::run`], which drives `imgdeck-core`.

mod cli;
mod commands;
mod logging;
mod prompt;
mod report;
mod session;
mod watcher;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use imgdeck_core::Config;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;

    let config = Config::load_or_default(cli.config.as_deref()).context("failed to load config")?;
    tracing::debug!(?config, "configuration loaded");

    commands::run(cli.command, &config, cli.json).await
}
