// Path: crates/networking/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # castnet Networking
//!
//! The node's transport layer: WebSocket dialer and listener tasks that
//! funnel everything through a single event channel, the registries that
//! track who is connected, and the dispatcher that fans protocol frames out
//! to all of them.

pub mod dispatcher;
pub mod registry;
pub mod ws;

pub use registry::{ClientList, PeerEntry, PeerRegistry};
pub use ws::{dial, listen, ClientId, ListenerHandle, NetEvent, OutboundHandle};
