mod config;
mod contacts;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod summary;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::contacts::fixtures::FixtureStore;
use crate::llm_client::{LlmClient, ObjectStreamer};
use crate::routes::build_router;
use crate::state::AppState;
use crate::summary::cache::{InMemorySummaryCache, RedisSummaryCache, SummaryCache};
use crate::summary::generator::SummaryGenerator;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Caseboard API v{}", env!("CARGO_PKG_VERSION"));

    // Model client, or canned summaries when no key is configured
    let streamer: Option<Arc<dyn ObjectStreamer>> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(llm))
        }
        None => {
            info!("ANTHROPIC_API_KEY not set, serving canned summaries");
            None
        }
    };

    // Summary cache
    let cache: Arc<dyn SummaryCache> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!(
                "Summary cache: Redis (ttl {}s)",
                config.summary_cache_ttl_secs
            );
            Arc::new(RedisSummaryCache::new(
                client,
                config.summary_cache_ttl_secs,
            ))
        }
        None => {
            info!("Summary cache: in-memory");
            Arc::new(InMemorySummaryCache::new())
        }
    };

    let contacts = Arc::new(FixtureStore::seeded(chrono::Utc::now()));
    info!("Loaded {} contacts", contacts.list().len());

    let state = AppState {
        summaries: Arc::new(SummaryGenerator::new(streamer, contacts.clone(), cache)),
        contacts,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
