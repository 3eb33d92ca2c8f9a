//! Intent Router REST API Server
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (in-memory store)
//! GEMINI_API_KEY=... cargo run --bin router_server --features server
//!
//! # Postgres-backed store
//! DATABASE_URL=postgresql://localhost/intent_router \
//!   cargo run --bin router_server --features server,database
//!
//! curl -X POST http://localhost:3000/api/chat \
//!   -H "Content-Type: application/json" \
//!   -d '{"query": "How many products cost at least 100?"}'
//!
//! curl http://localhost:3000/api/health
//! ```

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use intent_router::api::create_router_api;
use intent_router::{IntentRouter, RouterConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = RouterConfig::from_env().context("loading router configuration")?;

    #[allow(unused_mut)]
    let mut builder = IntentRouter::builder(config.clone());

    #[cfg(feature = "database")]
    if let Some(pg_config) =
        intent_router::database::PgStoreConfig::from_store_config(&config.store)
    {
        let store = intent_router::database::PgRecordStore::connect(&pg_config).await?;
        store.ensure_schema().await?;
        builder = builder.store(Arc::new(store));
    }

    let router = Arc::new(builder.build()?);

    let app = create_router_api(router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = std::env::var("ROUTER_LISTEN_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()
        .context("parsing ROUTER_LISTEN_ADDR")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Intent router listening on http://{}", addr);
    info!("  POST /api/chat");
    info!("  GET  /api/health");

    axum::serve(listener, app).await?;

    Ok(())
}
