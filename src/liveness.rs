//! HTTP liveness probe.
//!
//! Answers from static data only, so it stays up while the gateway or the
//! token endpoint is failing.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::mcp::{SERVER_NAME, SERVER_VERSION};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Liveness {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        service: SERVER_NAME,
        version: SERVER_VERSION,
    })
}

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Serve `GET /health` on `listener` until `cancel` fires.
pub async fn serve(listener: TcpListener, cancel: CancellationToken) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "liveness probe listening");
    axum::serve(listener, router())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

/// Bind `addr` and serve until `cancel` fires.
pub async fn bind_and_serve(addr: SocketAddr, cancel: CancellationToken) -> std::io::Result<()> {
    serve(TcpListener::bind(addr).await?, cancel).await
}
