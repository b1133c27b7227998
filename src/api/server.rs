use std::net::SocketAddr;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::{
    services::{handle_message, health},
    state::AppState,
};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_message))
        .route("/health", get(health))
        .with_state(state)
        // gzip request bodies are decompressed before the size check
        .layer(RequestDecompressionLayer::new())
}

/// Serve the synchronous entry point until Ctrl+C or SIGTERM
pub async fn run(address: SocketAddr, state: AppState) -> Result<(), AnyError> {
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "Resize API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(crate::shutdown::signal())
        .await?;

    info!("Resize API stopped");
    Ok(())
}
