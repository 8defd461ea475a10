mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use orchestrator::MedicalAssistant;
use providers::{ApiKey, GeminiClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_tracing() {
    // RUST_LOG wins; otherwise only warnings, so stdout stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = config::load_settings(cli.config.as_deref())?;
    let api_key = ApiKey::from_env().context("a Gemini API key is required")?;
    let client = GeminiClient::new(api_key, &settings)?;
    tracing::info!(model = client.model(), "gemini client ready");

    let assistant = MedicalAssistant::new(Arc::new(client), settings);
    commands::run(cli.command, &assistant).await
}
