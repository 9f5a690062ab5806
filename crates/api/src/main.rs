use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use leadbid_auction::{
    AuctionDispatcher, AuctionEngine, BuyerConfigurationRegistry, HttpBuyerTransport,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadbid_api::config::ServerConfig;
use leadbid_api::router::build_app_router;
use leadbid_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "leadbid_api=debug,leadbid_auction=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY is not set; admin token exchange is disabled");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = leadbid_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    leadbid_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    leadbid_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Auction engine ---
    let transport = HttpBuyerTransport::new().expect("Failed to build buyer HTTP client");
    let registry = Arc::new(BuyerConfigurationRegistry::new(
        pool.clone(),
        config.auction.config_cache_ttl,
    ));
    let engine = Arc::new(AuctionEngine::new(
        pool.clone(),
        registry,
        transport,
        &config.auction,
    ));
    tracing::info!(
        max_concurrent_pings = config.auction.max_concurrent_pings,
        "Auction engine ready",
    );

    // --- Auction dispatcher ---
    let dispatcher_cancel = CancellationToken::new();
    let dispatcher = AuctionDispatcher::new(pool.clone(), Arc::clone(&engine), &config.auction);
    let dispatcher_cancel_clone = dispatcher_cancel.clone();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(dispatcher_cancel_clone).await;
    });

    // --- App state + router ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        auction: engine,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // An auction already underway finishes; no new lead is claimed.
    dispatcher_cancel.cancel();
    if tokio::time::timeout(shutdown_timeout, dispatcher_handle)
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Auction dispatcher did not stop in time",
        );
    } else {
        tracing::info!("Auction dispatcher stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
