// Path: crates/node/src/handle.rs
//! The public facade.
//!
//! A [`Node`] is a cheap, cloneable handle over the core task's command
//! channel. Handles can be moved into subscribers, other tasks, or the
//! binary's signal handlers; the node stops once every handle is dropped.

use crate::core::{NodeCommand, NodeCore};
use crate::events::NodeEvent;
use castnet_api::{AcceptAll, BallotPolicy, EngineEvent, PayloadPolicy, ProtocolEngine};
use castnet_consensus::{shared_store, CastBallotPolicy, SharedCastStore, SlotOrchestrator};
use castnet_crypto::{CryptoError, Keypair};
use castnet_types::error::{ErrorCode, NetworkError, SendError};
use castnet_types::{Channel, Delivery, PublicKey, Sha};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Errors surfaced by the facade.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The core task has stopped; no handle can reach it anymore.
    #[error("The node task has stopped")]
    Stopped,
    /// A `send` failed.
    #[error(transparent)]
    Send(#[from] SendError),
    /// A connection operation failed.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// A keypair operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ErrorCode for NodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Stopped => "NODE_STOPPED",
            Self::Send(e) => e.code(),
            Self::Network(e) => e.code(),
            Self::Crypto(e) => e.code(),
        }
    }
}

/// What a protocol engine is constructed from.
///
/// Handed to the engine factory by [`NodeBuilder::spawn`]; everything the
/// engine contract requires is here, plus the shared cast store for engines
/// that want chain context of their own.
pub struct EngineSetup {
    /// The node's address.
    pub identity: PublicKey,
    /// The ballot policy binding ballots to cast semantics.
    pub policy: Arc<dyn BallotPolicy>,
    /// The node's cast store.
    pub store: SharedCastStore,
    /// Where the engine reports everything it does.
    pub events: mpsc::UnboundedSender<EngineEvent>,
}

/// Assembles and starts a node.
pub struct NodeBuilder {
    keypair: Option<Keypair>,
    payload_policy: Arc<dyn PayloadPolicy>,
}

impl NodeBuilder {
    /// A builder with a fresh random identity and the accept-all payload
    /// policy.
    pub fn new() -> Self {
        Self {
            keypair: None,
            payload_policy: Arc::new(AcceptAll),
        }
    }

    /// Uses this identity instead of generating one.
    pub fn keypair(mut self, keypair: Keypair) -> Self {
        self.keypair = Some(keypair);
        self
    }

    /// Installs an application payload policy.
    pub fn payload_policy(mut self, policy: Arc<dyn PayloadPolicy>) -> Self {
        self.payload_policy = policy;
        self
    }

    /// Builds the core, constructs the engine through `make_engine`, and
    /// spawns the core task. Must run inside a tokio runtime.
    pub fn spawn<E, F>(self, make_engine: F) -> Result<Node, NodeError>
    where
        E: ProtocolEngine,
        F: FnOnce(EngineSetup) -> E,
    {
        let keypair = match self.keypair {
            Some(keypair) => keypair,
            None => Keypair::generate()?,
        };
        let store = shared_store();
        let policy: Arc<dyn BallotPolicy> = Arc::new(CastBallotPolicy::new(
            store.clone(),
            self.payload_policy,
        ));

        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let engine = make_engine(EngineSetup {
            identity: keypair.public_key(),
            policy,
            store: store.clone(),
            events: engine_tx,
        });

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (net_tx, net_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(256);

        let core = NodeCore::new(
            keypair,
            engine,
            SlotOrchestrator::new(store),
            command_rx,
            engine_rx,
            net_rx,
            net_tx,
            event_tx.clone(),
        );
        tokio::spawn(core.run());

        Ok(Node {
            commands: command_tx,
            events: event_tx,
        })
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to a running node.
#[derive(Clone)]
pub struct Node {
    commands: mpsc::UnboundedSender<NodeCommand>,
    events: broadcast::Sender<NodeEvent>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").finish_non_exhaustive()
    }
}

impl Node {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> NodeCommand,
    ) -> Result<T, NodeError> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(build(tx)).map_err(|_| NodeError::Stopped)?;
        rx.await.map_err(|_| NodeError::Stopped)
    }

    /// The node's address.
    pub async fn public_key(&self) -> Result<PublicKey, NodeError> {
        self.request(|reply| NodeCommand::PublicKey { reply }).await
    }

    /// The base64 seed of the current keypair.
    pub async fn private_key(&self) -> Result<String, NodeError> {
        self.request(|reply| NodeCommand::PrivateKey { reply }).await
    }

    /// Replaces the current keypair, deterministically when a seed phrase is
    /// given. Only safe before any connection exists; the node logs a
    /// warning otherwise.
    pub async fn generate_keypair(&self, seed: Option<&str>) -> Result<PublicKey, NodeError> {
        let seed = seed.map(str::to_string);
        self.request(|reply| NodeCommand::GenerateKeypair { seed, reply })
            .await?
            .map_err(NodeError::from)
    }

    /// Dials a peer and registers it (registry and engine node set)
    /// immediately. Resolves on the first open, or with the first failure.
    /// A duplicate connect for the same key supersedes the prior entry.
    pub async fn peer_connect(&self, url: &str, pk: PublicKey) -> Result<(), NodeError> {
        let url = url.to_string();
        self.request(|reply| NodeCommand::PeerConnect { url, pk, reply })
            .await?
            .map_err(NodeError::from)
    }

    /// A `(public key, url)` snapshot of the registered peers.
    pub async fn peer_list(&self) -> Result<Vec<(PublicKey, String)>, NodeError> {
        self.request(|reply| NodeCommand::PeerList { reply }).await
    }

    /// Closes and forgets a peer.
    pub async fn peer_disconnect(&self, pk: &PublicKey) -> Result<(), NodeError> {
        let pk = pk.clone();
        self.request(|reply| NodeCommand::PeerDisconnect { pk, reply })
            .await
    }

    /// Accepts inbound transports on `port`, replacing any prior listener.
    /// Returns the bound address (useful with port 0).
    pub async fn listen(&self, port: u16) -> Result<SocketAddr, NodeError> {
        self.request(|reply| NodeCommand::Listen { port, reply })
            .await?
            .map_err(NodeError::from)
    }

    /// Appends a subscriber for `channel`. Subscribers run on the core task
    /// in registration order, once per externalized cast; re-entrant `send`
    /// calls from inside a subscriber are supported.
    pub async fn receive(
        &self,
        channel: &str,
        subscriber: impl FnMut(Delivery) + Send + 'static,
    ) -> Result<(), NodeError> {
        let channel = Channel::new(channel)
            .map_err(|_| NodeError::Send(SendError::InvalidChannel(channel.to_string())))?;
        self.request(|reply| NodeCommand::Receive {
            channel,
            subscriber: Box::new(subscriber),
            reply,
        })
        .await
    }

    /// Proposes `payload` on `channel`; resolves with the cast's digest once
    /// the network externalizes it.
    pub async fn send(
        &self,
        channel: &str,
        payload: impl Into<Vec<u8>>,
    ) -> Result<Sha, NodeError> {
        let channel = channel.to_string();
        let payload = payload.into();
        self.request(|reply| NodeCommand::Send {
            channel,
            payload,
            reply,
        })
        .await?
        .map_err(NodeError::from)
    }

    /// Installs a quorum slice on the engine.
    pub async fn add_quorum(&self, slice: Vec<PublicKey>) -> Result<(), NodeError> {
        self.request(|reply| NodeCommand::AddQuorum { slice, reply })
            .await
    }

    /// Removes a quorum slice from the engine.
    pub async fn remove_quorum(&self, slice: Vec<PublicKey>) -> Result<(), NodeError> {
        self.request(|reply| NodeCommand::RemoveQuorum { slice, reply })
            .await
    }

    /// Subscribes to connection lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }
}
