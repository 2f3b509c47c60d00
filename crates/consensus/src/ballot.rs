// Path: crates/consensus/src/ballot.rs
//! The ballot policy binding FBA ballots to cast semantics.
//!
//! The verifier decides global validity: the ballot's value must be an
//! internally sound cast for the slot's channel and sender, the application
//! payload policy must approve it, and the retry rate gate must have opened.
//! The acceptor decides the local pledge: the cast must extend this node's
//! view of the sender's chain. A node that refuses to accept still adopts
//! the value if the rest of the network externalizes it.

use crate::cast::verify_cast;
use crate::store::SharedCastStore;
use castnet_api::{Ballot, BallotPolicy, PayloadPolicy, SlotContext};
use castnet_types::{Cast, PublicKey};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The spacing the rate gate enforces between consecutive retry ballots.
pub const RETRY_INTERVAL_MS: u64 = 1000;

/// A [`BallotPolicy`] whose ballots carry serialized casts.
pub struct CastBallotPolicy {
    store: SharedCastStore,
    payload_policy: Arc<dyn PayloadPolicy>,
}

impl CastBallotPolicy {
    /// Builds the policy over the node's cast store and an application
    /// payload policy.
    pub fn new(store: SharedCastStore, payload_policy: Arc<dyn PayloadPolicy>) -> Self {
        Self {
            store,
            payload_policy,
        }
    }

    fn parse_cast(slot: &SlotContext, ballot: &Ballot) -> Option<Cast> {
        match Cast::from_json(&ballot.x) {
            Ok(cast) => Some(cast),
            Err(e) => {
                debug!(target: "consensus", slot = %slot.id, "ballot value is not a cast: {}", e);
                None
            }
        }
    }
}

impl BallotPolicy for CastBallotPolicy {
    fn generate(&self, slot: &SlotContext, value: &str) -> Ballot {
        let n = slot.ballot.as_ref().map(|b| b.n + 1).unwrap_or(0);
        Ballot {
            n,
            x: value.to_string(),
        }
    }

    fn verify(&self, slot: &SlotContext, ballot: &Ballot, _node: &PublicKey) -> bool {
        let Some(cast) = Self::parse_cast(slot, ballot) else {
            return false;
        };

        if !verify_cast(&slot.id.sender, &slot.id.channel, &cast) {
            debug!(target: "consensus", slot = %slot.id, "ballot cast failed verification");
            return false;
        }

        if !self
            .payload_policy
            .verify(&slot.id.sender, &slot.id.channel, &cast.pay)
        {
            debug!(target: "consensus", slot = %slot.id, "payload policy refused the cast");
            return false;
        }

        // Rate gate: ballot n may not be tried before n seconds have passed
        // on the slot. A stalling node cannot flood higher ballots.
        let gate = Duration::from_millis(ballot.n.saturating_mul(RETRY_INTERVAL_MS));
        if slot.created_at.elapsed() < gate {
            debug!(
                target: "consensus",
                slot = %slot.id, n = ballot.n,
                "ballot ahead of the retry rate gate"
            );
            return false;
        }

        true
    }

    fn accept(&self, slot: &SlotContext, ballot: &Ballot, _node: &PublicKey) -> bool {
        let Some(cast) = Self::parse_cast(slot, ballot) else {
            return false;
        };

        if !cast.prv.is_empty() {
            let store = self.store.read();
            match store.latest(&slot.id.channel, &slot.id.sender) {
                Some(latest) if latest.sha == cast.prv => {}
                Some(_) => {
                    debug!(
                        target: "consensus",
                        slot = %slot.id,
                        "refusing pledge: cast does not extend the known chain"
                    );
                    return false;
                }
                // No context to pledge on a chained cast we have no chain for.
                None => {
                    debug!(
                        target: "consensus",
                        slot = %slot.id,
                        "refusing pledge: no chain context for a chained cast"
                    );
                    return false;
                }
            }
        }

        self.payload_policy
            .accept(&slot.id.sender, &slot.id.channel, &cast.pay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::generate_cast;
    use crate::store::shared_store;
    use castnet_api::AcceptAll;
    use castnet_crypto::Keypair;
    use castnet_types::{Channel, Sha, SlotId};
    use std::time::Instant;

    struct RefuseAll;
    impl PayloadPolicy for RefuseAll {
        fn verify(&self, _: &PublicKey, _: &Channel, _: &str) -> bool {
            false
        }
        fn accept(&self, _: &PublicKey, _: &Channel, _: &str) -> bool {
            false
        }
    }

    fn policy() -> CastBallotPolicy {
        CastBallotPolicy::new(shared_store(), Arc::new(AcceptAll))
    }

    fn keypair() -> Keypair {
        Keypair::from_seed_phrase("ballot-tests").unwrap()
    }

    fn channel() -> Channel {
        Channel::new("test").unwrap()
    }

    fn slot_for(cast: &castnet_types::Cast, keypair: &Keypair) -> SlotContext {
        SlotContext::new(SlotId::new(
            channel(),
            keypair.public_key(),
            cast.sha.clone(),
        ))
    }

    fn aged(mut slot: SlotContext, millis: u64) -> SlotContext {
        slot.created_at = Instant::now() - Duration::from_millis(millis);
        slot
    }

    #[test]
    fn generator_counts_up_from_zero() {
        let policy = policy();
        let keypair = keypair();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "x").unwrap();
        let mut slot = slot_for(&cast, &keypair);

        let first = policy.generate(&slot, "value");
        assert_eq!(first.n, 0);

        // Each retry strictly increases n.
        slot.ballot = Some(first);
        let second = policy.generate(&slot, "value");
        assert_eq!(second.n, 1);
        slot.ballot = Some(second);
        assert_eq!(policy.generate(&slot, "value").n, 2);
    }

    #[test]
    fn verifier_approves_a_sound_fresh_ballot() {
        let policy = policy();
        let keypair = keypair();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "foo bar").unwrap();
        let slot = slot_for(&cast, &keypair);
        let ballot = Ballot {
            n: 0,
            x: cast.to_json().unwrap(),
        };
        assert!(policy.verify(&slot, &ballot, &keypair.public_key()));
    }

    #[test]
    fn verifier_rejects_garbage_and_forgeries() {
        let policy = policy();
        let keypair = keypair();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "foo bar").unwrap();
        let slot = slot_for(&cast, &keypair);
        let me = keypair.public_key();

        // Not a cast at all.
        let ballot = Ballot {
            n: 0,
            x: "not json".to_string(),
        };
        assert!(!policy.verify(&slot, &ballot, &me));

        // A cast signed by someone else entirely.
        let other = Keypair::from_seed_phrase("an impostor").unwrap();
        let forged = generate_cast(&other, &channel(), &Sha::empty(), "foo bar").unwrap();
        let ballot = Ballot {
            n: 0,
            x: forged.to_json().unwrap(),
        };
        assert!(!policy.verify(&slot, &ballot, &me));
    }

    #[test]
    fn verifier_consults_the_payload_policy() {
        let policy = CastBallotPolicy::new(shared_store(), Arc::new(RefuseAll));
        let keypair = keypair();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "foo bar").unwrap();
        let slot = slot_for(&cast, &keypair);
        let ballot = Ballot {
            n: 0,
            x: cast.to_json().unwrap(),
        };
        assert!(!policy.verify(&slot, &ballot, &keypair.public_key()));
    }

    #[test]
    fn rate_gate_holds_ballots_to_their_schedule() {
        let policy = policy();
        let keypair = keypair();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "foo bar").unwrap();
        let ballot = Ballot {
            n: 3,
            x: cast.to_json().unwrap(),
        };
        let me = keypair.public_key();

        // Ballot 3 before 3000ms have elapsed: rejected.
        let young = slot_for(&cast, &keypair);
        assert!(!policy.verify(&young, &ballot, &me));

        // The same ballot once the slot is old enough: accepted.
        let old = aged(slot_for(&cast, &keypair), 3500);
        assert!(policy.verify(&old, &ballot, &me));
    }

    #[test]
    fn acceptor_requires_chain_context() {
        let store = shared_store();
        let policy = CastBallotPolicy::new(store.clone(), Arc::new(AcceptAll));
        let keypair = keypair();
        let me = keypair.public_key();

        let first = generate_cast(&keypair, &channel(), &Sha::empty(), "one").unwrap();
        let second = generate_cast(&keypair, &channel(), &first.sha, "two").unwrap();
        let ballot = Ballot {
            n: 0,
            x: second.to_json().unwrap(),
        };
        let slot = slot_for(&second, &keypair);

        // No store entry for the pair: refuse to pledge on a chained cast.
        assert!(!policy.accept(&slot, &ballot, &me));

        // Once the first cast externalized, the pledge goes through.
        store
            .write()
            .record(channel(), me.clone(), first.clone());
        assert!(policy.accept(&slot, &ballot, &me));

        // A stale prv (chain has moved on) refuses again.
        let third = generate_cast(&keypair, &channel(), &second.sha, "three").unwrap();
        store.write().record(channel(), me.clone(), third);
        assert!(!policy.accept(&slot, &ballot, &me));
    }

    #[test]
    fn acceptor_pledges_first_links_without_context() {
        let policy = policy();
        let keypair = keypair();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "one").unwrap();
        let ballot = Ballot {
            n: 0,
            x: cast.to_json().unwrap(),
        };
        let slot = slot_for(&cast, &keypair);
        assert!(policy.accept(&slot, &ballot, &keypair.public_key()));
    }
}
