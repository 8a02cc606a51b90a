mod assistant;
mod config;
mod db;
mod dialogue;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::classifier::LlmClassifier;
use crate::assistant::generator::LlmGenerator;
use crate::config::Config;
use crate::db::create_pool;
use crate::dialogue::orchestrator::Orchestrator;
use crate::dialogue::session::ChatService;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMate API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    let store = Arc::new(PgStore::new(db));

    // Initialize LLM client; retries of one call share the per-call bound
    let attempt_timeout = llm_client::attempt_timeout(config.llm_timeout);
    let llm = LlmClient::new(config.anthropic_api_key.clone(), attempt_timeout)?;
    info!(
        timeout_secs = config.llm_timeout.as_secs(),
        attempt_timeout_secs = attempt_timeout.as_secs(),
        "LLM client initialized (model: {})",
        llm_client::MODEL
    );

    let orchestrator = Orchestrator::new(
        Arc::new(LlmClassifier::new(llm.clone(), config.llm_timeout)),
        Arc::new(LlmGenerator::new(llm, config.llm_timeout)),
        store.clone(),
        store.clone(),
    );

    let state = AppState {
        chat: Arc::new(ChatService::new(orchestrator, store.clone())),
        jobs: store.clone(),
        memory: store,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
