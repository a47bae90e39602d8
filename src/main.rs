//! Mindscroll — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the engine, the stimulus tasks, and
//! middleware.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mindscroll::engine::{EngineConfig, EngineHandle};
use mindscroll::settings::Settings;
use mindscroll::stimulus::{spawn_poll, POLL_INTERVAL};
use mindscroll::{api, metrics::Metrics};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mindscroll=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments. This enables
    // MINDSCROLL_SETTINGS_PATH / MINDSCROLL_API_TOKEN from .env.
    let _ = dotenvy::dotenv();

    init_tracing();

    let settings = Settings::load();
    let config = EngineConfig::default();

    let prometheus = Metrics::init(config.cache_capacity);
    let handle = EngineHandle::new(settings, config);

    // Periodic fallback poll; the scroll/mutation coalescers live inside the
    // router state.
    let _poll = spawn_poll(handle.clone(), POLL_INTERVAL);

    let router = api::create_router(handle).merge(prometheus.router());

    let addr: SocketAddr = std::env::var("MINDSCROLL_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
        .parse()?;
    tracing::info!(%addr, "mindscroll engine listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
