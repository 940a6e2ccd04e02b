//! Liveness endpoint for the hosting platform.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use relay_core::{session::RelayState, Result};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: &'static str,
    pub users: usize,
    pub port: u16,
}

#[derive(Clone)]
struct HealthState {
    relay: Arc<RelayState>,
    port: u16,
}

async fn health(State(st): State<HealthState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "Bot is running",
        users: st.relay.user_count().await,
        port: st.port,
    })
}

fn router(relay: Arc<RelayState>, port: u16) -> Router {
    Router::new()
        .route("/", get(health))
        .with_state(HealthState { relay, port })
}

/// Serve `GET /` on `0.0.0.0:<port>` until `shutdown` fires.
pub async fn serve(port: u16, relay: Arc<RelayState>, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "health endpoint listening");

    axum::serve(listener, router(relay, port))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
