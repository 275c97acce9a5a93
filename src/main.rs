mod cli;
mod commands;
mod config;
mod endpoints;
mod errors;
mod graphdb;
mod ids;
mod lang;
mod model;
mod pipeline;
mod project;
mod sinks;
mod stages;
mod store;
mod walk;

use crate::errors::CpgResult;
use clap::Parser;
use cli::Cli;
use console::style;
use std::time::Instant;
use tracing_subscriber::fmt::time;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .pretty()
        .with_thread_ids(true)
        .with_timer(time::UtcTime::rfc_3339());

    Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt_layer)
        .init();
}

fn main() -> CpgResult<()> {
    let now = Instant::now();
    init_tracing();

    tracing::debug!("cpgtaint starting up");
    let cli = Cli::parse();

    commands::handle_command(cli.command)?;

    println!(
        "{} in {:.3}s.",
        style("Finished").green().bold(),
        now.elapsed().as_secs_f32()
    );
    Ok(())
}
