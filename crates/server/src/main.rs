use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod server;

use config::ServerConfig;
use server::ServiceState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecode_server=info,ecode_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting exchange code service");

    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    info!("Record store: {}", config.lifecycle.store_endpoint);
    info!("Listening on: {}:{}", config.host, config.port);

    let state = Arc::new(ServiceState::new(config)?);
    server::run(state).await?;
    Ok(())
}
