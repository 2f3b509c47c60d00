// Path: crates/consensus/src/orchestrator.rs
//! The slot orchestrator.
//!
//! Translates `send(channel, payload)` into a protocol request on a fresh
//! slot, tracks the pending request until the engine resolves it, and turns
//! externalized values into store updates, reclaim instructions, and
//! subscriber deliveries. The orchestrator is the externalization handler's
//! home and therefore the cast store's only writer; `send` itself only reads
//! the store (to pick up `prv`), which is what makes re-entrant sends from
//! subscribers safe.

use crate::cast::{generate_cast, verify_cast};
use crate::store::SharedCastStore;
use castnet_api::ProtocolEngine;
use castnet_crypto::Keypair;
use castnet_types::error::{EngineError, SendError};
use castnet_types::{Cast, Channel, Delivery, Sha, SlotId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// The request budget handed to the engine for every proposal.
pub const REQUEST_BUDGET: Duration = Duration::from_millis(2000);

/// The outcome of a successful externalization.
#[derive(Debug)]
pub struct Externalized {
    /// The sender's superseded slot, to be reclaimed from the engine.
    pub reclaim: Option<SlotId>,
    /// What the channel's subscribers receive.
    pub delivery: Delivery,
}

/// Orchestrates slot lifecycles between the facade and the engine.
pub struct SlotOrchestrator {
    store: SharedCastStore,
    pending: HashMap<SlotId, oneshot::Sender<Result<Sha, SendError>>>,
}

impl SlotOrchestrator {
    /// Builds an orchestrator over the node's shared cast store.
    pub fn new(store: SharedCastStore) -> Self {
        Self {
            store,
            pending: HashMap::new(),
        }
    }

    /// The shared cast store.
    pub fn store(&self) -> &SharedCastStore {
        &self.store
    }

    /// The number of requests awaiting resolution.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Proposes `payload` on `channel`. The reply sender resolves with the
    /// externalized cast's digest, or with the first error on the path.
    /// Invalid input is reported without ever reaching the engine.
    pub fn submit<E: ProtocolEngine>(
        &mut self,
        engine: &mut E,
        keypair: &Keypair,
        channel: &str,
        payload: Vec<u8>,
        reply: oneshot::Sender<Result<Sha, SendError>>,
    ) {
        match self.prepare(keypair, channel, payload) {
            Ok((slot, value)) => {
                debug!(target: "consensus", slot = %slot, "requesting slot");
                self.pending.insert(slot.clone(), reply);
                engine.request(slot, value, REQUEST_BUDGET);
            }
            Err(e) => {
                // The caller may have dropped the receiver already; nothing
                // else to do with the error in that case.
                let _ = reply.send(Err(e));
            }
        }
    }

    fn prepare(
        &self,
        keypair: &Keypair,
        channel: &str,
        payload: Vec<u8>,
    ) -> Result<(SlotId, String), SendError> {
        let channel =
            Channel::new(channel).map_err(|_| SendError::InvalidChannel(channel.to_string()))?;
        let payload = String::from_utf8(payload).map_err(|_| SendError::InvalidPayload)?;

        let me = keypair.public_key();
        let prv = self.store.read().latest_sha(&channel, &me);
        let cast = generate_cast(keypair, &channel, &prv, &payload)
            .map_err(|e| SendError::Internal(e.to_string()))?;
        let value = cast
            .to_json()
            .map_err(|e| SendError::Internal(e.to_string()))?;
        let slot = cast.slot_id(channel, me);
        Ok((slot, value))
    }

    /// Settles a pending request. Returns whether a caller was waiting;
    /// a second resolution for the same slot is ignored.
    pub fn resolve(&mut self, slot: &SlotId, result: Result<String, EngineError>) -> bool {
        let Some(tx) = self.pending.remove(slot) else {
            debug!(target: "consensus", slot = %slot, "resolution for an already-settled slot");
            return false;
        };
        let outcome = result.map_err(SendError::from).and_then(|value| {
            Cast::from_json(&value)
                .map(|cast| cast.sha)
                .map_err(|e| SendError::Engine(format!("externalized value is not a cast: {}", e)))
        });
        let _ = tx.send(outcome);
        true
    }

    /// Handles an externalized value for a slot.
    ///
    /// Re-verifies the cast (signature and digest only; chain continuity was
    /// the acceptor's concern), records it as the pair's latest, and reports
    /// the superseded slot for reclaiming. An invalid cast is logged and
    /// dropped: the store and subscribers are untouched and the slot is left
    /// for the engine to collect.
    pub fn externalize(&mut self, slot: &SlotId, value: &str) -> Option<Externalized> {
        let cast = match Cast::from_json(value) {
            Ok(cast) => cast,
            Err(e) => {
                warn!(
                    target: "consensus",
                    slot = %slot, code = "invalid_cast",
                    "externalized value is not a cast: {}", e
                );
                return None;
            }
        };
        if !verify_cast(&slot.sender, &slot.channel, &cast) {
            warn!(
                target: "consensus",
                slot = %slot, code = "invalid_cast",
                "externalized cast failed signature or digest verification"
            );
            return None;
        }

        let prior = self
            .store
            .write()
            .record(slot.channel.clone(), slot.sender.clone(), cast.clone());
        let reclaim = prior.map(|superseded| {
            SlotId::new(slot.channel.clone(), slot.sender.clone(), superseded.sha)
        });

        Some(Externalized {
            reclaim,
            delivery: Delivery {
                channel: slot.channel.clone(),
                sender: slot.sender.clone(),
                sha: cast.sha,
                pay: cast.pay,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::shared_store;

    fn keypair() -> Keypair {
        Keypair::from_seed_phrase("orchestrator-tests").unwrap()
    }

    fn channel() -> Channel {
        Channel::new("test").unwrap()
    }

    #[test]
    fn externalize_records_and_reports_reclaim() {
        let keypair = keypair();
        let me = keypair.public_key();
        let mut orchestrator = SlotOrchestrator::new(shared_store());

        let first = generate_cast(&keypair, &channel(), &Sha::empty(), "one").unwrap();
        let slot1 = first.slot_id(channel(), me.clone());
        let out = orchestrator
            .externalize(&slot1, &first.to_json().unwrap())
            .unwrap();
        assert!(out.reclaim.is_none(), "first cast supersedes nothing");
        assert_eq!(out.delivery.pay, "one");

        let second = generate_cast(&keypair, &channel(), &first.sha, "two").unwrap();
        let slot2 = second.slot_id(channel(), me.clone());
        let out = orchestrator
            .externalize(&slot2, &second.to_json().unwrap())
            .unwrap();
        assert_eq!(out.reclaim, Some(slot1), "prior slot is reclaimed");
        assert_eq!(
            orchestrator.store().read().latest_sha(&channel(), &me),
            second.sha
        );
    }

    #[test]
    fn invalid_casts_never_touch_the_store() {
        let keypair = keypair();
        let me = keypair.public_key();
        let mut orchestrator = SlotOrchestrator::new(shared_store());

        let genuine = generate_cast(&keypair, &channel(), &Sha::empty(), "one").unwrap();
        let slot = genuine.slot_id(channel(), me.clone());

        // A forged payload under the genuine digest.
        let mut forged = genuine.clone();
        forged.pay = "evil".to_string();
        assert!(orchestrator
            .externalize(&slot, &forged.to_json().unwrap())
            .is_none());
        // Garbage value.
        assert!(orchestrator.externalize(&slot, "not json").is_none());

        assert!(orchestrator.store().read().is_empty());
    }

    #[test]
    fn second_resolution_is_ignored() {
        let mut orchestrator = SlotOrchestrator::new(shared_store());
        let keypair = keypair();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "one").unwrap();
        let slot = cast.slot_id(channel(), keypair.public_key());

        // No pending entry at all: ignored.
        assert!(!orchestrator.resolve(&slot, Err(EngineError::Timeout)));
    }
}
