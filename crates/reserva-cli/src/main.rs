//! Reserva CLI
//!
//! Command-line front end for the Reserva resource-reservation backend.
//! Credentials persist between runs; `watch` keeps the session refreshed.

#![warn(clippy::pedantic)]

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use common::config::{ObservabilityConfig, DEFAULT_LOG_FILTER};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&ObservabilityConfig::new(cli.log.clone(), cli.json_logs));

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(target: "reserva.cli", error = ?e, "Command failed");
            eprintln!("error: {}", output::error_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
