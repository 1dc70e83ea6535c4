//! Gatehouse API server entry point

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use gatehouse_api::{
    auth::RedisSessionStore,
    routes::create_router,
    AppState, Config,
};
use gatehouse_shared::PgUserDirectory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("load configuration")?;
    let bind_address = config.bind_address.clone();

    let pool = gatehouse_shared::create_pool(&config.database_url)
        .await
        .context("connect to database")?;
    gatehouse_shared::run_migrations(&pool)
        .await
        .context("run migrations")?;

    let redis_client =
        redis::Client::open(config.redis_url.clone()).context("parse redis url")?;
    let redis_conn = redis_client
        .get_connection_manager()
        .await
        .context("connect to redis")?;

    let state = AppState::new(
        config,
        Arc::new(PgUserDirectory::new(pool)),
        Arc::new(RedisSessionStore::new(redis_conn)),
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("bind {bind_address}"))?;
    tracing::info!(addr = %bind_address, "gatehouse-api listening");

    axum::serve(listener, create_router(state))
        .await
        .context("server error")?;

    Ok(())
}
