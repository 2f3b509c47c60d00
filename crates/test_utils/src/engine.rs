// Path: crates/test_utils/src/engine.rs
//! A loopback protocol engine.
//!
//! Honors the [`ProtocolEngine`] contract without federated voting: a
//! requested value is nominated to the wire and externalized on every node
//! that verifies it, exactly once per slot. That exercises the whole
//! orchestration pipeline (ballots, externalization, reclaim, timeouts)
//! against a full mesh, which is all the core's tests need. Nominations are
//! not re-broadcast, so meshes must be fully connected.

use castnet_api::{Ballot, BallotPolicy, EngineEvent, ProtocolEngine, QuorumSet, SlotContext};
use castnet_types::error::EngineError;
use castnet_types::{PublicKey, SlotId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const FRAME_KIND_NOMINATE: &str = "nom";

#[derive(Debug, Serialize, Deserialize)]
struct NominateFrame {
    k: String,
    slot: String,
    ballot: Ballot,
}

/// What the engine does with inbound and outbound proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Verify, nominate, externalize.
    Normal,
    /// Swallow requests so the request budget expires.
    Stalled,
    /// Skip verification on ingress; models a byzantine engine feeding the
    /// node values that never passed ballot checks.
    Permissive,
}

/// Observer handle for assertions after the engine has moved into a node.
#[derive(Debug, Clone, Default)]
pub struct LoopbackProbe {
    requests: Arc<Mutex<Vec<SlotId>>>,
    reclaims: Arc<Mutex<Vec<SlotId>>>,
}

impl LoopbackProbe {
    /// Slots requested so far, in order.
    pub fn requests(&self) -> Vec<SlotId> {
        self.requests.lock().clone()
    }

    /// Slots reclaimed so far, in order.
    pub fn reclaims(&self) -> Vec<SlotId> {
        self.reclaims.lock().clone()
    }
}

/// The loopback engine. See the module docs for its (non-)semantics.
pub struct LoopbackEngine {
    identity: PublicKey,
    policy: Arc<dyn BallotPolicy>,
    events: mpsc::UnboundedSender<EngineEvent>,
    quorums: QuorumSet,
    slots: HashMap<SlotId, SlotContext>,
    externalized: HashSet<SlotId>,
    pending: Arc<Mutex<HashSet<SlotId>>>,
    probe: LoopbackProbe,
    mode: Mode,
}

impl LoopbackEngine {
    /// A well-behaved engine.
    pub fn new(
        identity: PublicKey,
        policy: Arc<dyn BallotPolicy>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            identity,
            policy,
            events,
            quorums: QuorumSet::new(),
            slots: HashMap::new(),
            externalized: HashSet::new(),
            pending: Arc::new(Mutex::new(HashSet::new())),
            probe: LoopbackProbe::default(),
            mode: Mode::Normal,
        }
    }

    /// An engine that never resolves a request, so the budget expires.
    pub fn stalled(
        identity: PublicKey,
        policy: Arc<dyn BallotPolicy>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            mode: Mode::Stalled,
            ..Self::new(identity, policy, events)
        }
    }

    /// An engine that externalizes inbound nominations without verifying
    /// them. For byzantine-ingress tests.
    pub fn permissive(
        identity: PublicKey,
        policy: Arc<dyn BallotPolicy>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            mode: Mode::Permissive,
            ..Self::new(identity, policy, events)
        }
    }

    /// The observer handle; clone it before handing the engine away.
    pub fn probe(&self) -> LoopbackProbe {
        self.probe.clone()
    }

    fn arm_timeout(&self, slot: SlotId, timeout: Duration) {
        let pending = Arc::clone(&self.pending);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if pending.lock().remove(&slot) {
                let _ = events.send(EngineEvent::Resolved {
                    slot,
                    result: Err(EngineError::Timeout),
                });
            }
        });
    }

    fn externalize(&mut self, slot: SlotId, value: String) {
        if !self.externalized.insert(slot.clone()) {
            return;
        }
        // Value first: the node core drains events in order, so the store
        // update lands before the requester's callback resolves.
        let _ = self.events.send(EngineEvent::Value {
            slot: slot.clone(),
            value: value.clone(),
        });
        if self.pending.lock().remove(&slot) {
            let _ = self.events.send(EngineEvent::Resolved {
                slot,
                result: Ok(value),
            });
        }
    }
}

impl ProtocolEngine for LoopbackEngine {
    fn process(&mut self, frame: serde_json::Value) -> Result<(), EngineError> {
        let frame: NominateFrame = serde_json::from_value(frame)
            .map_err(|e| EngineError::Internal(format!("unrecognized frame: {}", e)))?;
        if frame.k != FRAME_KIND_NOMINATE {
            return Ok(());
        }
        let slot = SlotId::parse(&frame.slot)
            .map_err(|e| EngineError::Internal(format!("bad slot id: {}", e)))?;
        if self.externalized.contains(&slot) {
            return Ok(());
        }

        let context = self
            .slots
            .entry(slot.clone())
            .or_insert_with(|| SlotContext::new(slot.clone()));
        let verified = self.mode == Mode::Permissive
            || self.policy.verify(context, &frame.ballot, &self.identity);
        if !verified {
            debug!(target: "test-engine", slot = %slot, "refusing inbound nomination");
            return Ok(());
        }

        self.externalize(slot, frame.ballot.x);
        Ok(())
    }

    fn request(&mut self, slot: SlotId, value: String, timeout: Duration) {
        self.probe.requests.lock().push(slot.clone());
        self.pending.lock().insert(slot.clone());
        self.arm_timeout(slot.clone(), timeout);

        if self.mode == Mode::Stalled {
            return;
        }

        let context = self
            .slots
            .entry(slot.clone())
            .or_insert_with(|| SlotContext::new(slot.clone()));
        let ballot = self.policy.generate(context, &value);
        context.ballot = Some(ballot.clone());

        if !self.policy.verify(context, &ballot, &self.identity) {
            self.pending.lock().remove(&slot);
            let _ = self.events.send(EngineEvent::Resolved {
                slot,
                result: Err(EngineError::Rejected(
                    "local ballot verification failed".to_string(),
                )),
            });
            return;
        }

        let frame = NominateFrame {
            k: FRAME_KIND_NOMINATE.to_string(),
            slot: slot.to_string(),
            ballot,
        };
        match serde_json::to_value(&frame) {
            Ok(encoded) => {
                let _ = self.events.send(EngineEvent::Message(encoded));
            }
            Err(e) => debug!(target: "test-engine", "failed to encode nomination: {}", e),
        }

        self.externalize(slot, value);
    }

    fn reclaim(&mut self, slot: &SlotId) {
        self.probe.reclaims.lock().push(slot.clone());
        self.slots.remove(slot);
    }

    fn quorums(&mut self) -> &mut QuorumSet {
        &mut self.quorums
    }
}
