use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::Serialize;
use tracing::{Instrument, info_span, warn};

use super::{error::ApiError, state::AppState, utils};
use crate::job::Operation;
use crate::worker::JobError;

/// Id reported in logs for jobs run by the HTTP entry point
const HTTP_WORKER_ID: usize = 0;

#[derive(Debug, Serialize)]
pub struct ResizeResponse {
    pub from: String,
    pub to: String,
    pub width: u32,
    pub height: u32,
    pub method: String,
}

/// Synchronous resize endpoint (POST /)
///
/// Runs the operation inline and answers once the result is stored.
/// No queue is involved, so there is nothing to acknowledge.
pub async fn handle_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    utils::require_json(&headers)?;

    let body_bytes = read_body(body, state.max_payload_bytes).await?;

    let metrics = state.processor.metrics();
    metrics.job_received();

    let operation = Operation::decode(&body_bytes).map_err(|e| {
        metrics.decode_failed();
        warn!(error = %e, "Rejected undecodable operation");
        JobError::from(e)
    })?;

    state
        .processor
        .process(&operation)
        .instrument(info_span!("job", worker = HTTP_WORKER_ID, source = "http"))
        .await?;

    let response = ResizeResponse {
        from: operation.from.to_string(),
        to: operation.to.to_string(),
        width: operation.width,
        height: operation.height,
        method: operation.method.to_string(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Reads the request body, failing as soon as it grows past `max_size`
///
/// The limit applies to the decompressed stream, so a small gzip body cannot
/// inflate past it.
async fn read_body(body: axum::body::Body, max_size: usize) -> Result<Vec<u8>, ApiError> {
    let collected = Limited::new(body, max_size).collect().await.map_err(|err| {
        if err.is::<LengthLimitError>() {
            ApiError::PayloadTooLarge(max_size)
        } else {
            ApiError::InvalidPayload(format!("unreadable body: {err}"))
        }
    })?;

    Ok(collected.to_bytes().to_vec())
}

/// Health check endpoint (GET /health)
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
