use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::worker::JobError;

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("payload invalid: {0}")]
    InvalidPayload(String),
    #[error("payload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Malformed input is the caller's fault; everything else is ours
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) | ApiError::PayloadTooLarge(_) => StatusCode::BAD_REQUEST,
            ApiError::Job(JobError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Job(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::Job(JobError::Decode(_)) => "INVALID_OPERATION",
            ApiError::Job(JobError::Fetch(_)) => "FETCH_FAILED",
            ApiError::Job(JobError::Transform(_) | JobError::TransformAborted(_)) => {
                "TRANSFORM_FAILED"
            }
            ApiError::Job(JobError::Store(_)) => "STORE_FAILED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
