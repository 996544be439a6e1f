mod archive;
mod cli;
mod config;
mod embedding;
mod errors;
mod generation;
mod llm_client;
mod models;
mod render;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::{bail, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::build_embedder;
use crate::generation::generator::TailorSettings;
use crate::llm_client::LlmClient;
use crate::render::LatexAssembler;
use crate::routes::build_router;
use crate::state::AppState;

const USAGE: &str = "usage: tailor [run | serve | render]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor v{}", env!("CARGO_PKG_VERSION"));

    let command = std::env::args().nth(1);
    let state = build_state(config).await?;

    match command.as_deref() {
        None | Some("run") => cli::run_interactive(&state).await,
        Some("render") => cli::run_render(&state).await,
        Some("serve") => serve(state).await,
        Some(other) => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

async fn build_state(config: Config) -> Result<AppState> {
    let llm = LlmClient::new(&config)?;
    info!("LLM client initialized (model: {})", llm.model());

    let embedder = build_embedder(&config).await?;
    info!(
        "Embedder initialized ({:?}: {})",
        config.embedding_backend, config.embedding_model
    );

    let assembler = LatexAssembler::new(config.latex_program.clone());

    Ok(AppState {
        llm: Arc::new(llm),
        embedder,
        assembler: Arc::new(assembler),
        settings: TailorSettings::from_config(&config),
        config,
    })
}

async fn serve(state: AppState) -> Result<()> {
    let port = state.config.port;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
