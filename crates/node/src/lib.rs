// Path: crates/node/src/lib.rs
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

//! # castnet Node
//!
//! The public face of the node: a cloneable [`Node`] handle backed by a
//! single core task that owns every piece of state (keypair, cast store,
//! subscribers, pending requests, peer registry, client list, and the
//! protocol engine). All state transitions happen on that task; the handle
//! only enqueues commands, which is what makes calling back into the node
//! from a subscriber safe.

mod core;
mod events;
mod handle;

pub use events::NodeEvent;
pub use handle::{EngineSetup, Node, NodeBuilder, NodeError};
