#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names
)]

use anyhow::{Context, Result};
use blackboard::BoardConfig;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod app;
mod cli;

use cli::commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let mut config =
        BoardConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(project) = &cli.project {
        config = config.with_project(project.clone());
    }
    if let Some(agent) = &cli.agent {
        config = config.with_agent(agent.clone());
    }
    config.validate()?;

    app::dispatch::dispatch(cli, config).await
}
