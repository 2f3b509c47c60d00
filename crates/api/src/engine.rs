// Path: crates/api/src/engine.rs
//! The protocol-engine contract.
//!
//! The FBA engine is an external collaborator: the node constructs it with
//! its identity, a ballot policy, and an event sender, then drives it from
//! the single core task. The engine never calls back into the node directly;
//! everything it wants the node to do arrives as an [`EngineEvent`].

use castnet_types::error::EngineError;
use castnet_types::SlotId;
use serde_json::Value;
use std::time::Duration;

use crate::quorum::QuorumSet;

/// What a protocol engine emits while running.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A protocol frame to fan out to every connected peer and client. The
    /// frame is opaque to the node; it is wrapped in the `fba` envelope and
    /// forwarded verbatim.
    Message(Value),
    /// A slot externalized with the given agreed value. Fires for every
    /// externalization, locally requested or not.
    Value {
        /// The externalized slot.
        slot: SlotId,
        /// The agreed value (a serialized cast in this system).
        value: String,
    },
    /// A locally issued request reached a terminal state. Fires exactly once
    /// per request; the node ignores any duplicate.
    Resolved {
        /// The requested slot.
        slot: SlotId,
        /// The externalized value, or why the request failed.
        result: Result<String, EngineError>,
    },
}

/// The contract every protocol engine honors.
///
/// All methods are invoked from the node's core task; an engine may spawn
/// its own timers but must funnel every effect through its event sender.
pub trait ProtocolEngine: Send + 'static {
    /// Feeds one inbound protocol frame (the `m` of an `fba` envelope).
    fn process(&mut self, frame: Value) -> Result<(), EngineError>;

    /// Proposes `value` for `slot`, to be resolved within `timeout` via an
    /// [`EngineEvent::Resolved`].
    fn request(&mut self, slot: SlotId, value: String, timeout: Duration);

    /// Declares a slot terminal; the engine is free to drop its state.
    fn reclaim(&mut self, slot: &SlotId);

    /// The quorum structure, for direct configuration by the caller.
    fn quorums(&mut self) -> &mut QuorumSet;
}
