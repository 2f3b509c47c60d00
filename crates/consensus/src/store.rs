// Path: crates/consensus/src/store.rs
//! The in-memory cast store.
//!
//! One entry per `(channel, sender)` pair: the latest externalized cast.
//! The externalization handler is the only writer; `send` and the ballot
//! acceptor read. Entries are never removed during a run.

use castnet_types::{Cast, Channel, PublicKey, Sha};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps `(channel, sender)` to that pair's latest externalized cast.
#[derive(Debug, Default)]
pub struct CastStore {
    entries: HashMap<(Channel, PublicKey), Cast>,
}

impl CastStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest externalized cast for the pair, if any.
    pub fn latest(&self, channel: &Channel, sender: &PublicKey) -> Option<&Cast> {
        self.entries.get(&(channel.clone(), sender.clone()))
    }

    /// The digest a new cast from `sender` on `channel` must chain to:
    /// the latest entry's `sha`, or the empty digest when the chain has not
    /// started.
    pub fn latest_sha(&self, channel: &Channel, sender: &PublicKey) -> Sha {
        self.latest(channel, sender)
            .map(|cast| cast.sha.clone())
            .unwrap_or_else(Sha::empty)
    }

    /// Records an externalized cast, returning the entry it supersedes.
    pub fn record(&mut self, channel: Channel, sender: PublicKey, cast: Cast) -> Option<Cast> {
        self.entries.insert((channel, sender), cast)
    }

    /// The number of `(channel, sender)` pairs tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no cast has externalized yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The store handle shared between the orchestrator (writer) and the ballot
/// acceptor (reader). Every access happens on the core task, so the lock is
/// uncontended; it exists to satisfy the `Send + Sync` seam of the policy
/// trait.
pub type SharedCastStore = Arc<RwLock<CastStore>>;

/// A fresh shared store.
pub fn shared_store() -> SharedCastStore {
    Arc::new(RwLock::new(CastStore::new()))
}
