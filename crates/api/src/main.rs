use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use llmscope_api::config::ServerConfig;
use llmscope_api::router::build_app_router;
use llmscope_api::state::AppState;
use llmscope_core::openground::ProviderKind;
use llmscope_core::vault::SecretCipher;
use llmscope_db::DbPool;
use llmscope_providers::ProviderRegistry;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "llmscope_api=debug,llmscope_providers=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let pool = connect_database().await;
    let state = build_state(pool.clone(), &config);
    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, pool.close()).await.is_err() {
        tracing::warn!(timeout_secs = config.shutdown_timeout_secs, "Database pool did not close in time");
    }
    tracing::info!("Shutdown complete");
}

/// Human-readable logs by default, JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connect, verify the connection and apply migrations.
///
/// # Panics
///
/// Panics when `DATABASE_URL` is unset or any step fails.
async fn connect_database() -> DbPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = llmscope_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    llmscope_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    llmscope_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database ready, migrations applied");
    pool
}

fn build_state(pool: DbPool, config: &ServerConfig) -> AppState {
    let cipher = SecretCipher::from_base64_key(&config.vault_encryption_key)
        .expect("VAULT_ENCRYPTION_KEY must be base64 of 32 bytes");

    let providers = ProviderRegistry::new(
        Duration::from_secs(config.provider_timeout_secs),
        config.provider_keys.clone(),
    )
    .expect("Failed to build provider HTTP client");

    for kind in ProviderKind::ALL {
        tracing::info!(
            provider = kind.as_str(),
            env_key = providers.has_env_key(kind),
            "Provider configured"
        );
    }

    AppState {
        pool,
        config: Arc::new(config.clone()),
        cipher,
        providers,
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
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
        () = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
