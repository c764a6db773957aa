use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::{Settings, initialize_app_state};
use crate::router::create_router;

pub async fn serve(settings: &Settings) -> Result<()> {
    debug!("Serving with {:?}", settings);
    let state = initialize_app_state(settings)
        .await
        .context("cannot build application state")?;

    let listener = TcpListener::bind(&settings.bind_address)
        .await
        .with_context(|| format!("cannot bind {}", settings.bind_address))?;

    info!(
        "Listening on http://{0}, docs at http://{0}/swagger-ui",
        settings.bind_address
    );
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
