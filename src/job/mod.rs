//! Job descriptor: the wire payload of a resize request
//!
//! ```json
//! {
//!   "from":   { "bucket": "b1", "key": "a.png" },
//!   "to":     { "bucket": "b2", "key": "a.jpg" },
//!   "method": "Bilinear",
//!   "width":  100,
//!   "height": 50
//! }
//! ```
//!
//! Unknown fields are ignored. `method`, `width` and `height` may be
//! omitted; `from` and `to` are required.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::transform::InterpolationMethod;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed job payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid {field} location: {reason}")]
    InvalidLocation { field: &'static str, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// A `(bucket, key)` pair in the object store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub bucket: String,
    pub key: String,
}

impl Location {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    fn validate(&self, field: &'static str) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(DecodeError::InvalidLocation { field, reason: "empty bucket" });
        }
        if self.key.is_empty() {
            return Err(DecodeError::InvalidLocation { field, reason: "empty key" });
        }
        Ok(())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Decoded resize request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub from: Location,
    pub to: Location,
    #[serde(default)]
    pub method: InterpolationMethod,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl Operation {
    /// Parse and validate a job payload
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let op: Operation = serde_json::from_slice(payload)?;
        op.from.validate("from")?;
        op.to.validate("to")?;
        Ok(op)
    }

    pub fn decode_str(payload: &str) -> Result<Self> {
        Self::decode(payload.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"from":{"bucket":"b1","key":"a.png"},"to":{"bucket":"b2","key":"a.jpg"},"method":"Bilinear","width":100,"height":50}"#;

    #[test]
    fn test_decode_full_payload() {
        let op = Operation::decode_str(SAMPLE).unwrap();
        assert_eq!(op.from, Location::new("b1", "a.png"));
        assert_eq!(op.to, Location::new("b2", "a.jpg"));
        assert_eq!(op.method, InterpolationMethod::Bilinear);
        assert_eq!((op.width, op.height), (100, 50));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let first = Operation::decode_str(SAMPLE).unwrap();
        let second = Operation::decode_str(SAMPLE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_method_and_dimensions_default() {
        let op = Operation::decode_str(
            r#"{"from":{"bucket":"b","key":"k"},"to":{"bucket":"b","key":"k2"}}"#,
        )
        .unwrap();
        assert_eq!(op.method, InterpolationMethod::Lanczos3);
        assert_eq!((op.width, op.height), (0, 0));
    }

    #[test]
    fn test_bogus_and_empty_method_default_to_lanczos3() {
        for method in ["bogus", ""] {
            let payload = format!(
                r#"{{"from":{{"bucket":"b","key":"k"}},"to":{{"bucket":"b","key":"k"}},"method":"{method}"}}"#
            );
            let op = Operation::decode_str(&payload).unwrap();
            assert_eq!(op.method, InterpolationMethod::Lanczos3);
        }
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let op = Operation::decode_str(
            r#"{"from":{"bucket":"b","key":"k","region":"x"},"to":{"bucket":"b","key":"k"},"quality":90}"#,
        )
        .unwrap();
        assert_eq!(op.from.key, "k");
    }

    #[test]
    fn test_negative_dimension_rejected() {
        let err = Operation::decode_str(
            r#"{"from":{"bucket":"b","key":"k"},"to":{"bucket":"b","key":"k"},"width":-1}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_missing_location_rejected() {
        let err = Operation::decode_str(r#"{"to":{"bucket":"b","key":"k"}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let err = Operation::decode_str(
            r#"{"from":{"bucket":"","key":"k"},"to":{"bucket":"b","key":"k"}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidLocation { field: "from", .. }
        ));
    }

    #[test]
    fn test_not_json_rejected() {
        assert!(Operation::decode(b"<xml/>").is_err());
    }
}
