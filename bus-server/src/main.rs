use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use bus_server::engine::BusEngine;
use bus_server::eta::{EtaClient, EtaConfig};
use bus_server::snapshot::{SnapshotStore, StoreConfig};
use bus_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr: SocketAddr = std::env::var("BUS_SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()
        .expect("BUS_SERVER_ADDR must be a socket address");

    // The primary path is where reloads are read from; the bundled path
    // covers first boot, before any dataset has been installed.
    let primary_path =
        std::env::var("BUS_DATA_PATH").unwrap_or_else(|_| "data/installed.json".to_string());
    let bundled_path =
        std::env::var("BUS_BUNDLED_DATA_PATH").unwrap_or_else(|_| "data/bus_data.json".to_string());

    let mut eta_config = EtaConfig::new();
    if let Ok(secs) = std::env::var("BUS_HTTP_TIMEOUT_SECS") {
        let secs = secs
            .parse()
            .expect("BUS_HTTP_TIMEOUT_SECS must be a number of seconds");
        eta_config = eta_config.with_timeout(secs);
    }
    let provider = EtaClient::new(eta_config).expect("Failed to create arrival feed client");

    let store = SnapshotStore::open(StoreConfig::new(&primary_path, &bundled_path))
        .expect("No loadable snapshot; check BUS_DATA_PATH and BUS_BUNDLED_DATA_PATH");

    let state = AppState::new(BusEngine::new(store, provider));
    let app = create_router(state).layer(TraceLayer::new_for_http());

    info!(%addr, "bus server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app).await.expect("Server error");
}
