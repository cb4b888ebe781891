use anyhow::Result;
use backend::{axum_http::http_serve, config::config_loader};
use crates::infra::db::postgres::postgres_connection;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = ?err, "gym backend exited with error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("gym-backend")?;

    let config = config_loader::load()?;
    info!(
        polar_environment = ?config.polar.environment,
        sweep_interval_seconds = config.expiry_sweep.interval_seconds,
        "configuration loaded"
    );

    let db_pool = postgres_connection::establish_connection(&config.database.url)?;
    info!("Postgres connection pool established");

    http_serve::start(Arc::new(config), Arc::new(db_pool)).await
}
