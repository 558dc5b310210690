//! Heart Rate Service Server
//!
//! Loads configuration from the environment (and `.env`), connects to
//! PostgreSQL, applies migrations and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;

use heart_rate_service::{
    api::{build_app, AppState, RouterBuilder},
    config::{env, AppConfig},
    database::{run_migrations, PgStore, Store},
    service::{HeartRateService, JwtService, UserService},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // RUST_LOG wins; LOG_LEVEL is the fallback
    let log_level = env::get_string("LOG_LEVEL", "info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("Starting Heart Rate Service v{}", heart_rate_service::VERSION);

    let config = match AppConfig::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    log::info!("Configuration loaded and validated");
    log::info!("   - Bind address: {}", config.server.bind_address());
    log::info!("   - CORS origins: {}", config.server.cors_origins.join(", "));
    log::info!("   - Max request size: {} bytes", config.server.max_request_size);
    log::info!("   - Token algorithm: {:?}", config.jwt.algorithm);
    log::info!(
        "   - Token lifetime: {} minutes",
        config.jwt.access_token_expire_minutes
    );
    log::info!("   - bcrypt cost: {}", config.security.bcrypt_cost);

    let database_pool = config.database.create_pool().await?;

    log::info!("Running database migrations...");
    run_migrations(&database_pool).await?;
    log::info!("Database migrations completed");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(database_pool));

    let jwt_service = Arc::new(JwtService::from_config(store.clone(), &config.jwt));
    let user_service = Arc::new(UserService::with_bcrypt_cost(
        store.clone(),
        jwt_service.clone(),
        config.security.bcrypt_cost,
    ));
    let heart_rate_service = Arc::new(HeartRateService::new(store));

    spawn_revocation_cleanup(
        jwt_service.clone(),
        Duration::from_secs(config.security.revocation_cleanup_minutes * 60),
    );

    let app_state = AppState {
        user_service,
        heart_rate_service,
        jwt_service,
    };
    let app = build_app(app_state, &config.server);

    log::info!("API Endpoints:");
    for route in RouterBuilder::with_all_routes().route_table() {
        log::info!("     {}", route);
    }

    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
    log::info!("Server listening on {}", config.server.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

/// Periodically drop revocations for tokens that have expired anyway
fn spawn_revocation_cleanup(jwt_service: Arc<JwtService>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match jwt_service.purge_expired_revocations().await {
                Ok(0) => {}
                Ok(purged) => log::info!("Purged {} expired token revocations", purged),
                Err(e) => log::error!("Token revocation cleanup failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
