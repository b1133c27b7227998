//! Request checks for the resize endpoint

use axum::http::{HeaderMap, header::CONTENT_TYPE};

use crate::api::error::ApiError;

/// Require a JSON body. A request without Content-Type is read as JSON.
/// Media type parameters such as `charset` are ignored; `text/json` and
/// `+json` suffixes are not accepted.
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Ok(());
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::InvalidPayload("Content-Type is not valid ASCII".into()))?;

    let media: mime::Mime = raw
        .parse()
        .map_err(|_| ApiError::InvalidPayload(format!("unparseable Content-Type: {raw}")))?;

    match (media.type_(), media.subtype()) {
        (mime::APPLICATION, mime::JSON) => Ok(()),
        _ => Err(ApiError::InvalidPayload(format!(
            "expected application/json, got {}",
            media.essence_str()
        ))),
    }
}
