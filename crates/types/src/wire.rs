// Path: crates/types/src/wire.rs
//! The transport envelope.
//!
//! Every frame exchanged over a transport is a JSON object carrying a `t`
//! tag. The consensus core only speaks `t == "fba"`, whose `m` field is the
//! protocol engine's own (opaque, JSON-serializable) frame. Frames with an
//! unrecognized tag are tolerated and ignored so future subsystems can share
//! the wire without breaking older nodes.

use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The tag of protocol-engine frames.
pub const TAG_FBA: &str = "fba";

#[derive(Serialize, Deserialize)]
struct Envelope {
    t: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    m: Option<Value>,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A protocol-engine frame to feed to `process`.
    Fba(Value),
    /// A well-formed frame with an unknown tag; dropped silently.
    Ignored,
}

/// Wraps a protocol-engine frame for the wire: `{"t":"fba","m":<frame>}`.
pub fn encode_fba(frame: &Value) -> Result<String, CodecError> {
    crate::codec::to_json_canonical(&Envelope {
        t: TAG_FBA.to_string(),
        m: Some(frame.clone()),
    })
}

/// Decodes one inbound text frame.
///
/// Returns `Inbound::Ignored` for unknown tags; errors only on frames that
/// are not JSON, not an envelope, or are `fba` frames missing their body.
pub fn decode(text: &str) -> Result<Inbound, CodecError> {
    let envelope: Envelope = crate::codec::from_json_canonical(text)?;
    if envelope.t != TAG_FBA {
        return Ok(Inbound::Ignored);
    }
    match envelope.m {
        Some(frame) => Ok(Inbound::Fba(frame)),
        None => Err(CodecError::Schema(
            "fba frame is missing its body".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fba_roundtrip() {
        let frame = json!({"k": "nom", "slot": "c:pk:sha"});
        let encoded = encode_fba(&frame).unwrap();
        assert_eq!(decode(&encoded).unwrap(), Inbound::Fba(frame));
    }

    #[test]
    fn unknown_tags_are_ignored_silently() {
        assert_eq!(
            decode(r#"{"t":"qry","sha":"aa"}"#).unwrap(),
            Inbound::Ignored
        );
    }

    #[test]
    fn extra_fields_are_reserved_not_rejected() {
        // A `flags` field on an inbound frame is accepted and ignored.
        let decoded = decode(r#"{"t":"fba","m":{"k":"nom"},"flags":3}"#).unwrap();
        assert_eq!(decoded, Inbound::Fba(json!({"k": "nom"})));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"no_tag":1}"#).is_err());
        assert!(decode(r#"{"t":"fba"}"#).is_err());
    }
}
