//! Interoperability server - obstacle and server info feed for competition teams

use anyhow::Result;
use interop_server::{api, config::Config, persistence, state::AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("interop_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting interoperability server...");

    let config = Config::from_env();
    let port = config.server_port;
    tracing::info!("Moving obstacle epoch: {}", config.obstacle_epoch.to_rfc3339());

    let db = persistence::init_database(&config.database_path, config.database_max_connections)
        .await?;
    let state = Arc::new(AppState::new(db, config.clone()));
    state.load_from_database().await?;

    let app = api::routes(&config)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
