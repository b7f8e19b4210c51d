// src/main.rs

use std::net::SocketAddr;

use dotenvy::dotenv;
use examchain_backend::chain::Contracts;
use examchain_backend::clients::{FaceClient, IpfsClient};
use examchain_backend::config::Config;
use examchain_backend::routes;
use examchain_backend::state::AppState;
use examchain_backend::store::{MintQueue, NonceStore, RosterStore, SessionTracker};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Contract gateway: a node RPC endpoint, or the in-process stub when
    // RPC_URL=memory (local development without a chain).
    let contracts = if config.rpc_url == "memory" {
        tracing::warn!("RPC_URL=memory: using the in-process chain stub");
        Contracts::memory().0
    } else {
        Contracts::rpc(&config).expect("Failed to build contract gateway")
    };

    // Startup probe; the service still comes up when the node is down, the
    // fallback policy covers reads until it returns.
    match contracts.registration.whitelist_count().await {
        Ok(count) => tracing::info!(
            "Registration contract reachable (whitelist count: {})",
            count
        ),
        Err(e) => tracing::warn!("Registration contract not reachable yet: {}", e),
    }

    // Create AppState
    let state = AppState {
        nonces: NonceStore::new(),
        sessions: SessionTracker::new(),
        mints: MintQueue::new(),
        roster: RosterStore::new(&config.student_addresses_path),
        face: FaceClient::new(&config.ai_service_url),
        ipfs: IpfsClient::new(
            &config.pinata_api_key,
            &config.pinata_api_secret,
            &config.ipfs_gateway_url,
        ),
        contracts,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
