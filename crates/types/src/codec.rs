// Path: crates/types/src/codec.rs
//! The canonical JSON codec for every wire and value format.
//!
//! Everything this node puts on a wire or into a consensus value is UTF-8
//! JSON. Centralizing the encode/decode calls here keeps the representation
//! uniform across crates and gives parse failures a single error type that
//! the dispatcher can log and drop without unwinding.

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value to compact JSON.
pub fn to_json_canonical<T: Serialize>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|e| CodecError::Json(e.to_string()))
}

/// Decodes a value from JSON, failing fast on any schema mismatch.
pub fn from_json_canonical<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Json(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
    struct Sample {
        id: u32,
        name: String,
    }

    #[test]
    fn roundtrip() {
        let original = Sample {
            id: 42,
            name: "test-data".to_string(),
        };
        let encoded = to_json_canonical(&original).unwrap();
        let decoded: Sample = from_json_canonical(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn decode_failure_is_an_error_not_a_panic() {
        let result = from_json_canonical::<Sample>(r#"{"id":"not-a-number","name":1}"#);
        assert!(result.is_err());
    }
}
