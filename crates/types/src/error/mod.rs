// Path: crates/types/src/error/mod.rs
//! Core error types for the castnet node.
//!
//! Only `SendError` ever reaches a caller; every other failure is logged and
//! contained so the node stays live.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors from identifier construction and slot-id parsing.
#[derive(Debug, Error)]
pub enum IdError {
    /// The value contains the reserved `':'` delimiter.
    #[error("Identifier contains the reserved ':' delimiter: {value}")]
    ReservedDelimiter {
        /// The offending value.
        value: String,
    },
    /// The slot identifier did not split into `channel:pubkey:sha`.
    #[error("Malformed slot identifier: {value}")]
    MalformedSlotId {
        /// The offending value.
        value: String,
    },
}

impl ErrorCode for IdError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReservedDelimiter { .. } => "ID_RESERVED_DELIMITER",
            Self::MalformedSlotId { .. } => "ID_MALFORMED_SLOT",
        }
    }
}

/// Errors from the canonical JSON codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The text was not valid JSON or did not match the target schema.
    #[error("JSON codec error: {0}")]
    Json(String),
    /// The JSON was well-formed but structurally wrong for the wire.
    #[error("Wire schema error: {0}")]
    Schema(String),
}

impl ErrorCode for CodecError {
    fn code(&self) -> &'static str {
        match self {
            Self::Json(_) => "CODEC_JSON_ERROR",
            Self::Schema(_) => "CODEC_SCHEMA_ERROR",
        }
    }
}

/// Errors surfaced to `send` callers. This is the node's only user-facing
/// error surface.
#[derive(Debug, Error)]
pub enum SendError {
    /// The channel name contains the reserved `':'` delimiter.
    #[error("Invalid channel name: {0:?}")]
    InvalidChannel(String),
    /// The payload is not a UTF-8 byte string.
    #[error("Payload is not a valid byte string")]
    InvalidPayload,
    /// The protocol engine failed to externalize within its request budget.
    #[error("Consensus request timed out")]
    RequestTimeout,
    /// The protocol engine refused the proposed value.
    #[error("Consensus request rejected: {0}")]
    Rejected(String),
    /// The protocol engine failed internally, or resolved with a value that
    /// does not parse as a cast.
    #[error("Protocol engine error: {0}")]
    Engine(String),
    /// A local failure while building the proposal (e.g. signing).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ErrorCode for SendError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidChannel(_) => "SEND_INVALID_CHANNEL",
            Self::InvalidPayload => "SEND_INVALID_PAYLOAD",
            Self::RequestTimeout => "SEND_REQUEST_TIMEOUT",
            Self::Rejected(_) => "SEND_REJECTED",
            Self::Engine(_) => "SEND_ENGINE_ERROR",
            Self::Internal(_) => "SEND_INTERNAL",
        }
    }
}

impl From<EngineError> for SendError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Timeout => SendError::RequestTimeout,
            EngineError::Rejected(reason) => SendError::Rejected(reason),
            EngineError::Internal(reason) => SendError::Engine(reason),
        }
    }
}

/// Errors reported by a protocol engine when resolving a request.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The slot did not externalize within the request budget.
    #[error("Request budget exhausted before externalization")]
    Timeout,
    /// The engine refused the proposed value (e.g. ballot verification
    /// failed on the local node).
    #[error("Proposal rejected: {0}")]
    Rejected(String),
    /// An internal engine failure.
    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "ENGINE_REQUEST_TIMEOUT",
            Self::Rejected(_) => "ENGINE_REJECTED",
            Self::Internal(_) => "ENGINE_INTERNAL",
        }
    }
}

/// Errors from the transport layer. Surfaced as node events, never fatal.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    /// Dialing a peer failed.
    #[error("Failed to dial {url}: {reason}")]
    Dial {
        /// The URL that was dialed.
        url: String,
        /// The underlying failure.
        reason: String,
    },
    /// Binding the listener failed.
    #[error("Failed to bind {addr}: {reason}")]
    Bind {
        /// The address that was bound.
        addr: String,
        /// The underlying failure.
        reason: String,
    },
    /// The connection closed before or during a send.
    #[error("Connection closed")]
    Closed,
    /// A transport-level send or handshake failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ErrorCode for NetworkError {
    fn code(&self) -> &'static str {
        match self {
            Self::Dial { .. } => "NET_DIAL_FAILED",
            Self::Bind { .. } => "NET_BIND_FAILED",
            Self::Closed => "NET_CONNECTION_CLOSED",
            Self::Transport(_) => "NET_TRANSPORT_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_onto_send_errors() {
        assert!(matches!(
            SendError::from(EngineError::Timeout),
            SendError::RequestTimeout
        ));
        assert!(matches!(
            SendError::from(EngineError::Rejected("no quorum".into())),
            SendError::Rejected(_)
        ));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(SendError::InvalidPayload.code(), "SEND_INVALID_PAYLOAD");
        assert_eq!(EngineError::Timeout.code(), "ENGINE_REQUEST_TIMEOUT");
    }
}
