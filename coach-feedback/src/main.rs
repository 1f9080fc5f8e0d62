//! coach-feedback - Conversational feedback microservice
//!
//! Analyzes one learner turn per request and returns a short, ranked list
//! of language corrections.
//!
//! Configuration: `--config` → `COACH_CONFIG` → `~/.config/coach/config.toml`
//! → `/etc/coach/config.toml` → compiled defaults.

use anyhow::{Context, Result};
use clap::Parser;
use coach_common::config::{load_resolved_config, resolve_api_key, API_KEY_ENV, CONFIG_PATH_ENV};
use coach_feedback::specialists::{ChatClient, ChatCompletionSpecialist, SpecialistProfile};
use coach_feedback::{build_router, AppState, FeedbackPipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "coach-feedback")]
#[command(about = "Conversational feedback microservice")]
#[command(version)]
struct Args {
    /// Path to config.toml
    #[arg(short, long, env = "COACH_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind (overrides [server].host)
    #[arg(long, env = "COACH_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides [server].port)
    #[arg(short, long, env = "COACH_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_path) = load_resolved_config(args.config.as_deref(), CONFIG_PATH_ENV)
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting coach-feedback v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config_path {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: compiled defaults"),
    }

    let pipeline_config = coach_feedback::config::pipeline_config(&config.pipeline)?;
    coach_feedback::config::log_effective(&config, &pipeline_config);

    let api_key = resolve_api_key(API_KEY_ENV, &config)?;
    let client = Arc::new(ChatClient::new(&config.specialist, api_key)?);
    let specialists = ChatCompletionSpecialist::roster(SpecialistProfile::default_roster(), client);
    info!("Specialists: {}", specialists.len());

    let pipeline = Arc::new(FeedbackPipeline::new(specialists, pipeline_config)?);
    let state = AppState::new(pipeline);
    let app = build_router(state);

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
