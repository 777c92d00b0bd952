use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netzero_bridge::{config::AppConfig, create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "netzero_bridge=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.server_address();

    if config.service_account.is_none() {
        tracing::warn!("no Odoo service account configured; /api/emissions/summary will be unavailable");
    }

    let state = AppState::new(config)?;
    let app = create_app(state);

    tracing::info!("starting netzero-bridge on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
