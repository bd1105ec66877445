//! sitepipe - asset pipeline for static sites.

mod cli;
mod config;
mod embed;
mod logger;
mod pipeline;
mod reload;
mod serve;
mod shutdown;
mod source;
mod task;
mod transform;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = Arc::new(SiteConfig::load(&cli)?);

    // One event loop; CPU-bound transforms go to the blocking pool
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match cli.command() {
        Commands::Build => runtime.block_on(pipeline::build(config)),
        Commands::Dev => {
            let shutdown = shutdown::install()?;
            runtime.block_on(pipeline::dev(config, shutdown))
        }
    }
}
