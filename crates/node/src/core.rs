// Path: crates/node/src/core.rs
//! The single-actor core loop.
//!
//! One task owns the node: commands from facade handles, events from the
//! protocol engine, and events from the transports all land here, one at a
//! time. Subscriber dispatch goes through the core's own queue so the
//! engine's callstack always unwinds before application code runs; a
//! subscriber that calls `send` merely enqueues a command for a later turn.

use crate::events::NodeEvent;
use castnet_api::{EngineEvent, ProtocolEngine};
use castnet_consensus::SlotOrchestrator;
use castnet_crypto::{CryptoError, Keypair};
use castnet_networking::{
    dial, dispatcher, listen, ClientList, ListenerHandle, NetEvent, PeerEntry, PeerRegistry,
};
use castnet_types::error::{NetworkError, SendError};
use castnet_types::{Channel, Delivery, PublicKey, Sha};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

/// A channel subscriber. Invoked on the core task, in registration order.
pub(crate) type Subscriber = Box<dyn FnMut(Delivery) + Send>;

pub(crate) enum NodeCommand {
    PublicKey {
        reply: oneshot::Sender<PublicKey>,
    },
    PrivateKey {
        reply: oneshot::Sender<String>,
    },
    GenerateKeypair {
        seed: Option<String>,
        reply: oneshot::Sender<Result<PublicKey, CryptoError>>,
    },
    PeerConnect {
        url: String,
        pk: PublicKey,
        reply: oneshot::Sender<Result<(), NetworkError>>,
    },
    PeerList {
        reply: oneshot::Sender<Vec<(PublicKey, String)>>,
    },
    PeerDisconnect {
        pk: PublicKey,
        reply: oneshot::Sender<()>,
    },
    Listen {
        port: u16,
        reply: oneshot::Sender<Result<SocketAddr, NetworkError>>,
    },
    Receive {
        channel: Channel,
        subscriber: Subscriber,
        reply: oneshot::Sender<()>,
    },
    Send {
        channel: String,
        payload: Vec<u8>,
        reply: oneshot::Sender<Result<Sha, SendError>>,
    },
    AddQuorum {
        slice: Vec<PublicKey>,
        reply: oneshot::Sender<()>,
    },
    RemoveQuorum {
        slice: Vec<PublicKey>,
        reply: oneshot::Sender<()>,
    },
}

pub(crate) struct NodeCore<E: ProtocolEngine> {
    keypair: Keypair,
    engine: E,
    orchestrator: SlotOrchestrator,
    subscribers: HashMap<Channel, Vec<Subscriber>>,
    peers: PeerRegistry,
    clients: ClientList,
    listener: Option<ListenerHandle>,
    connecting: HashMap<PublicKey, oneshot::Sender<Result<(), NetworkError>>>,
    commands: mpsc::UnboundedReceiver<NodeCommand>,
    engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    net_events: mpsc::UnboundedReceiver<NetEvent>,
    net_events_tx: mpsc::UnboundedSender<NetEvent>,
    dispatch_tx: mpsc::UnboundedSender<Delivery>,
    dispatch_rx: mpsc::UnboundedReceiver<Delivery>,
    node_events: broadcast::Sender<NodeEvent>,
}

impl<E: ProtocolEngine> NodeCore<E> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        keypair: Keypair,
        engine: E,
        orchestrator: SlotOrchestrator,
        commands: mpsc::UnboundedReceiver<NodeCommand>,
        engine_events: mpsc::UnboundedReceiver<EngineEvent>,
        net_events: mpsc::UnboundedReceiver<NetEvent>,
        net_events_tx: mpsc::UnboundedSender<NetEvent>,
        node_events: broadcast::Sender<NodeEvent>,
    ) -> Self {
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        Self {
            keypair,
            engine,
            orchestrator,
            subscribers: HashMap::new(),
            peers: PeerRegistry::new(),
            clients: ClientList::new(),
            listener: None,
            connecting: HashMap::new(),
            commands,
            engine_events,
            net_events,
            net_events_tx,
            dispatch_tx,
            dispatch_rx,
            node_events,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    // Every facade handle is gone; nothing can reach the
                    // node anymore.
                    None => break,
                },
                Some(event) = self.engine_events.recv() => self.handle_engine_event(event),
                Some(event) = self.net_events.recv() => self.handle_net_event(event),
                Some(delivery) = self.dispatch_rx.recv() => self.dispatch(delivery),
            }
        }
        if let Some(listener) = self.listener.take() {
            listener.shutdown();
        }
        debug!(target: "node", "core task stopped");
    }

    async fn handle_command(&mut self, command: NodeCommand) {
        match command {
            NodeCommand::PublicKey { reply } => {
                let _ = reply.send(self.keypair.public_key());
            }
            NodeCommand::PrivateKey { reply } => {
                let _ = reply.send(self.keypair.secret_b64());
            }
            NodeCommand::GenerateKeypair { seed, reply } => {
                if !self.peers.is_empty() || !self.clients.is_empty() || self.listener.is_some() {
                    warn!(target: "node", "replacing the keypair while connections exist");
                }
                let generated = match seed {
                    Some(phrase) => Keypair::from_seed_phrase(phrase),
                    None => Keypair::generate(),
                };
                let _ = reply.send(generated.map(|keypair| {
                    let pk = keypair.public_key();
                    self.keypair = keypair;
                    pk
                }));
            }
            NodeCommand::PeerConnect { url, pk, reply } => {
                let handle = dial(url.clone(), pk.clone(), self.net_events_tx.clone());
                let entry = PeerEntry { url, handle };
                if let Some(superseded) = self.peers.insert(pk.clone(), entry) {
                    debug!(target: "node", peer = pk.short(), "superseding peer connection");
                    superseded.handle.close();
                }
                self.engine.quorums().add_node(pk.clone());
                // A superseded dial still in flight loses its caller here.
                self.connecting.insert(pk, reply);
            }
            NodeCommand::PeerList { reply } => {
                let _ = reply.send(self.peers.snapshot());
            }
            NodeCommand::PeerDisconnect { pk, reply } => {
                if let Some(entry) = self.peers.remove(&pk) {
                    entry.handle.close();
                }
                self.engine.quorums().remove_node(&pk);
                self.connecting.remove(&pk);
                let _ = reply.send(());
            }
            NodeCommand::Listen { port, reply } => {
                if let Some(previous) = self.listener.take() {
                    previous.shutdown();
                }
                match listen(port, self.net_events_tx.clone()).await {
                    Ok(listener) => {
                        let addr = listener.local_addr();
                        self.listener = Some(listener);
                        let _ = reply.send(Ok(addr));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            NodeCommand::Receive {
                channel,
                subscriber,
                reply,
            } => {
                self.subscribers.entry(channel).or_default().push(subscriber);
                let _ = reply.send(());
            }
            NodeCommand::Send {
                channel,
                payload,
                reply,
            } => {
                self.orchestrator
                    .submit(&mut self.engine, &self.keypair, &channel, payload, reply);
            }
            NodeCommand::AddQuorum { slice, reply } => {
                self.engine.quorums().add_quorum(slice);
                let _ = reply.send(());
            }
            NodeCommand::RemoveQuorum { slice, reply } => {
                self.engine.quorums().remove_quorum(&slice);
                let _ = reply.send(());
            }
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Message(frame) => {
                dispatcher::fan_out(&frame, &self.peers, &self.clients);
            }
            EngineEvent::Value { slot, value } => {
                if let Some(outcome) = self.orchestrator.externalize(&slot, &value) {
                    if let Some(prior) = outcome.reclaim {
                        self.engine.reclaim(&prior);
                    }
                    // Subscribers run on a later turn, after the engine's
                    // callstack has unwound.
                    let _ = self.dispatch_tx.send(outcome.delivery);
                }
            }
            EngineEvent::Resolved { slot, result } => {
                self.orchestrator.resolve(&slot, result);
            }
        }
    }

    fn handle_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::PeerOpen { pk } => {
                if let Some(reply) = self.connecting.remove(&pk) {
                    let _ = reply.send(Ok(()));
                }
                let url = self
                    .peers
                    .get(&pk)
                    .map(|entry| entry.url.clone())
                    .unwrap_or_default();
                self.emit(NodeEvent::PeerOpen { pk, url });
            }
            NetEvent::PeerMessage { pk, text } => {
                let source = pk.short().to_string();
                self.route_frame(&source, &text);
            }
            NetEvent::PeerError { pk, error } => {
                if let Some(reply) = self.connecting.remove(&pk) {
                    let _ = reply.send(Err(error.clone()));
                }
                let url = self.peers.get(&pk).map(|entry| entry.url.clone());
                self.emit(NodeEvent::PeerError { pk, url, error });
            }
            NetEvent::PeerClose { pk } => {
                let url = self.peers.get(&pk).map(|entry| entry.url.clone());
                self.emit(NodeEvent::PeerClose { pk, url });
            }
            NetEvent::ClientOpen { id, handle, addr } => {
                self.clients.add(id, handle);
                self.emit(NodeEvent::ClientOpen { id, addr });
            }
            NetEvent::ClientMessage { id, text } => {
                let source = id.to_string();
                self.route_frame(&source, &text);
            }
            NetEvent::ClientError { id, error } => {
                self.emit(NodeEvent::ClientError { id, error });
            }
            NetEvent::ClientClose { id } => {
                self.clients.remove(id);
                self.emit(NodeEvent::ClientClose { id });
            }
        }
    }

    fn route_frame(&mut self, source: &str, text: &str) {
        if let Some(frame) = dispatcher::route_inbound(source, text) {
            if let Err(e) = self.engine.process(frame) {
                debug!(target: "node", %source, "engine refused inbound frame: {}", e);
            }
        }
    }

    fn dispatch(&mut self, delivery: Delivery) {
        let Some(subscribers) = self.subscribers.get_mut(&delivery.channel) else {
            return;
        };
        debug!(
            target: "node",
            channel = %delivery.channel,
            sender = delivery.sender.short(),
            subscribers = subscribers.len(),
            "dispatching externalized cast"
        );
        for subscriber in subscribers.iter_mut() {
            subscriber(delivery.clone());
        }
    }

    fn emit(&self, event: NodeEvent) {
        // No receivers is fine; events are observability, not control flow.
        let _ = self.node_events.send(event);
    }
}
