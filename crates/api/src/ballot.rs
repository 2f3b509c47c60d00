// Path: crates/api/src/ballot.rs
//! Ballots and the pluggable policies that give them meaning.
//!
//! The engine rounds on opaque `(n, x)` ballots within a slot; it delegates
//! what a ballot *means* to a [`BallotPolicy`]. The split between `verify`
//! and `accept` follows the FBA principle that ballot validity is global
//! (every correct node must agree on it) while acceptance is local (a node
//! may pledge based on its own view).

use castnet_types::{Channel, PublicKey, SlotId};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// An `(n, x)` pair the engine rounds on within a slot: `n` is the retry
/// counter, `x` the proposed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// The retry counter; strictly increases across retries on a slot.
    pub n: u64,
    /// The proposed value (a serialized cast in this system).
    pub x: String,
}

/// The engine's view of one consensus slot, as exposed to policy callbacks.
#[derive(Debug, Clone)]
pub struct SlotContext {
    /// The slot identifier.
    pub id: SlotId,
    /// The slot's current ballot, if any round has started.
    pub ballot: Option<Ballot>,
    /// When the engine opened the slot; anchors the retry rate gate.
    pub created_at: Instant,
}

impl SlotContext {
    /// Opens a fresh slot view with no current ballot.
    pub fn new(id: SlotId) -> Self {
        Self {
            id,
            ballot: None,
            created_at: Instant::now(),
        }
    }
}

/// Binds the engine's generic ballot semantics to application meaning.
///
/// All three callbacks are pure with respect to engine state; the engine
/// calls them with a consistent [`SlotContext`] snapshot.
pub trait BallotPolicy: Send + Sync {
    /// Produces the next ballot to try for `value` on this slot.
    fn generate(&self, slot: &SlotContext, value: &str) -> Ballot;

    /// Whether the ballot is valid at all. A `false` here makes the engine
    /// reject the ballot entirely, on every correct node.
    fn verify(&self, slot: &SlotContext, ballot: &Ballot, node: &PublicKey) -> bool;

    /// Whether this node is willing to pledge for the ballot. Assumes
    /// `verify` already passed. A refusal is local and not fatal.
    fn accept(&self, slot: &SlotContext, ballot: &Ballot, node: &PublicKey) -> bool;
}

/// Application hook over cast payloads, consulted by the ballot policy.
/// Both checks default to approval.
pub trait PayloadPolicy: Send + Sync {
    /// Validity check; contributes to ballot verification.
    fn verify(&self, _sender: &PublicKey, _channel: &Channel, _payload: &str) -> bool {
        true
    }

    /// Acceptance check; contributes to the local pledge decision.
    fn accept(&self, _sender: &PublicKey, _channel: &Channel, _payload: &str) -> bool {
        true
    }
}

/// The default payload policy: everything is acceptable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PayloadPolicy for AcceptAll {}
