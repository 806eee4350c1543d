use anyhow::Context;
use formfill_api::{app_with_state, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "formfill_api=debug,formfill=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let address = config.bind_address()?;
    let app = app_with_state(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!("formfill API listening on http://{address}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
