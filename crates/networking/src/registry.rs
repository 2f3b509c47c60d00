// Path: crates/networking/src/registry.rs
//! Who the node is connected to.
//!
//! The peer registry is the authoritative holder of peer transport handles,
//! keyed by public key and iterated in registration order; the client list
//! tracks accepted inbound connections (identity unknown until they speak)
//! in accept order. Both exist to be fanned out over.

use crate::ws::{ClientId, OutboundHandle};
use castnet_types::PublicKey;

/// One registered peer.
#[derive(Debug, Clone)]
pub struct PeerEntry {
    /// The URL the peer was dialed on.
    pub url: String,
    /// The connection's outbound queue.
    pub handle: OutboundHandle,
}

/// `pk → {url, handle}` in registration order.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    entries: Vec<(PublicKey, PeerEntry)>,
}

impl PeerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer, superseding (and returning) any prior entry for
    /// the same key. A superseded peer keeps its registration position.
    pub fn insert(&mut self, pk: PublicKey, entry: PeerEntry) -> Option<PeerEntry> {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(key, _)| *key == pk) {
            return Some(std::mem::replace(existing, entry));
        }
        self.entries.push((pk, entry));
        None
    }

    /// Removes and returns a peer's entry.
    pub fn remove(&mut self, pk: &PublicKey) -> Option<PeerEntry> {
        let index = self.entries.iter().position(|(key, _)| key == pk)?;
        Some(self.entries.remove(index).1)
    }

    /// The entry for a peer, if registered.
    pub fn get(&self, pk: &PublicKey) -> Option<&PeerEntry> {
        self.entries
            .iter()
            .find(|(key, _)| key == pk)
            .map(|(_, entry)| entry)
    }

    /// Whether the peer is registered.
    pub fn contains(&self, pk: &PublicKey) -> bool {
        self.get(pk).is_some()
    }

    /// Iterates entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&PublicKey, &PeerEntry)> {
        self.entries.iter().map(|(pk, entry)| (pk, entry))
    }

    /// A `(pk, url)` snapshot in registration order, for `peer_list`.
    pub fn snapshot(&self) -> Vec<(PublicKey, String)> {
        self.entries
            .iter()
            .map(|(pk, entry)| (pk.clone(), entry.url.clone()))
            .collect()
    }

    /// The number of registered peers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no peer is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accepted inbound connections in accept order.
#[derive(Debug, Default)]
pub struct ClientList {
    clients: Vec<(ClientId, OutboundHandle)>,
}

impl ClientList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a newly accepted connection.
    pub fn add(&mut self, id: ClientId, handle: OutboundHandle) {
        self.clients.push((id, handle));
    }

    /// Drops a closed connection.
    pub fn remove(&mut self, id: ClientId) {
        self.clients.retain(|(existing, _)| *existing != id);
    }

    /// Iterates connections in accept order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClientId, &OutboundHandle)> {
        self.clients.iter().map(|(id, handle)| (id, handle))
    }

    /// The number of live connections.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
