//! Hazard navigation server - hosts one navigation engine for a client device

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hazard_server::config::Config;
use hazard_server::oracle::OsrmOracle;
use hazard_server::state::AppState;
use hazard_server::{api, loops};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("hazard_server=debug".parse()?))
        .init();

    tracing::info!("Starting hazard navigation server...");

    let config = Config::from_env();
    let rules = config.load_rules()?;
    let oracle = Arc::new(OsrmOracle::from_config(&config)?);
    tracing::info!(
        "Routing oracle at {} ({} profile)",
        config.routing_url,
        config.routing_profile
    );

    let port = config.server_port;
    let alert_feed_url = config.alert_feed_url.clone();
    let state = AppState::start(config, rules, oracle)?;

    // Start background loops
    match alert_feed_url {
        Some(url) => {
            tokio::spawn(loops::alert_sync_loop::run_alert_sync_loop(state.clone(), url));
        }
        None => tracing::info!("HAZARD_ALERT_FEED_URL not set; alerts come from the API only"),
    }

    // Build the app
    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
