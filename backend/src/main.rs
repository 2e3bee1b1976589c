//! Backend entry-point: loads settings, prepares the store, and serves the API.

mod server;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dolly_backend::inbound::http::health::HealthState;
use dolly_backend::outbound::persistence::{DbPool, PoolConfig, apply_migrations};
use ortho_config::OrthoConfig;

use server::{ServerConfig, ServerSettings, build_store, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let mut config = ServerConfig::from_settings(&settings)
        .map_err(|e| std::io::Error::other(format!("invalid settings: {e}")))?;

    if let Some(database_url) = settings.database_url() {
        let url = database_url.to_owned();
        let applied = tokio::task::spawn_blocking(move || apply_migrations(&url))
            .await
            .map_err(|e| std::io::Error::other(format!("migration task failed: {e}")))?
            .map_err(|e| std::io::Error::other(format!("migrations failed: {e}")))?;
        info!(applied, "database migrations applied");

        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.pool_max_size()),
        )
        .await
        .map_err(|e| std::io::Error::other(format!("database pool failed: {e}")))?;
        config = config.with_db_pool(pool);
    }

    let store = build_store(&config);
    let health_state = web::Data::new(HealthState::new().with_store(store.clone()));
    info!(addr = %config.bind_addr(), "starting dolly backend");
    let server = create_server(health_state.clone(), config, store)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
