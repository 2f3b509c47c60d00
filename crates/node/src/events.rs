// Path: crates/node/src/events.rs
//! Typed node lifecycle events.
//!
//! Replaces the source tradition of a stringly event emitter with one enum;
//! consumers subscribe through [`Node::events`](crate::Node::events) and get
//! a broadcast receiver.

use castnet_networking::ClientId;
use castnet_types::error::NetworkError;
use castnet_types::PublicKey;
use std::net::SocketAddr;

/// Connection lifecycle notifications from the facade.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// A dialed peer completed its handshake.
    PeerOpen {
        /// The peer's address.
        pk: PublicKey,
        /// The URL it was dialed on.
        url: String,
    },
    /// A peer connection ended.
    PeerClose {
        /// The peer's address.
        pk: PublicKey,
        /// The registered URL, when the peer is still registered.
        url: Option<String>,
    },
    /// A dial or transport failure on a peer connection.
    PeerError {
        /// The peer's address.
        pk: PublicKey,
        /// The registered URL, when the peer is still registered.
        url: Option<String>,
        /// What went wrong.
        error: NetworkError,
    },
    /// An inbound connection was accepted.
    ClientOpen {
        /// The connection's id.
        id: ClientId,
        /// The remote address.
        addr: SocketAddr,
    },
    /// An inbound connection ended.
    ClientClose {
        /// The connection's id.
        id: ClientId,
    },
    /// A transport failure on an inbound connection.
    ClientError {
        /// The connection's id.
        id: ClientId,
        /// What went wrong.
        error: NetworkError,
    },
}
