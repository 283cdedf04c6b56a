// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # parley
//!
//! Chat relay and side-by-side model comparison server. Relays browser chat
//! turns to OpenAI or Anthropic, keeps bounded per-model conversation
//! buffers, and persists reusable system-prompt templates in SQLite.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use parley::application::{ChatGateway, ConversationStore};
use parley::infrastructure::db::Database;
use parley::infrastructure::export::ExportWriter;
use parley::infrastructure::llm::anthropic::{AnthropicAdapter, ANTHROPIC_API_URL};
use parley::infrastructure::llm::openai::{OpenAiAdapter, OPENAI_API_URL};
use parley::infrastructure::repositories::SqlitePromptRepository;
use parley::presentation::api::{app, AppState};

/// parley - relay chat to LLM providers and compare their replies
#[derive(Parser)]
#[command(name = "parley")]
#[command(version, about, long_about = None)]
struct Cli {
    /// HTTP listen host
    #[arg(long, env = "PARLEY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value = "3010")]
    port: u16,

    /// Path to the SQLite prompt store
    #[arg(long, env = "PARLEY_DB", default_value = "parley.db", value_name = "FILE")]
    db: PathBuf,

    /// Directory served as the chat UI
    #[arg(long, env = "PARLEY_STATIC_DIR", default_value = "static", value_name = "DIR")]
    static_dir: PathBuf,

    /// Directory chat logs are exported into
    #[arg(long, env = "PARLEY_EXPORT_DIR", default_value = "exports", value_name = "DIR")]
    export_dir: PathBuf,

    /// Outbound request timeout in seconds
    #[arg(long, env = "PARLEY_REQUEST_TIMEOUT", default_value = "120")]
    request_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PARLEY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level)?;

    // Both keys are required up front; refusing to start beats failing on
    // the first chat request.
    let openai_key =
        std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
    let anthropic_key =
        std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY is not set")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.request_timeout))
        .build()
        .context("Failed to build HTTP client")?;

    let database = Database::open(&cli.db)
        .await
        .with_context(|| format!("Failed to open prompt store at {}", cli.db.display()))?;
    info!("Prompt store ready at {}", cli.db.display());

    let gateway = ChatGateway::new(vec![
        Arc::new(OpenAiAdapter::new(client.clone(), OPENAI_API_URL, openai_key)),
        Arc::new(AnthropicAdapter::new(client, ANTHROPIC_API_URL, anthropic_key)),
    ]);

    let state = AppState {
        gateway,
        history: Arc::new(ConversationStore::new()),
        prompts: Arc::new(SqlitePromptRepository::new(database.get_pool().clone())),
        exporter: ExportWriter::new(cli.export_dir),
        start_time: Instant::now(),
    };

    let router = app(state, &cli.static_dir);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("parley listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("parley shutting down");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
