// Path: crates/networking/src/ws.rs
//! WebSocket transport tasks.
//!
//! Each connection (dialed peer or accepted client) runs in its own task
//! with an unbounded outbound queue; everything a connection observes is
//! reported on the shared [`NetEvent`] channel, so the core loop stays the
//! only place that touches node state. Sends are fire-and-forget: a failure
//! surfaces as an error event, never as backpressure on the caller.

use castnet_types::error::NetworkError;
use castnet_types::PublicKey;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{accept_async, connect_async};
use tracing::{debug, warn};

/// Identifies one accepted inbound connection for the lifetime of the
/// process. Inbound connections carry no public key; the id is only a
/// fan-out and bookkeeping handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

impl ClientId {
    fn next() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Everything the transport layer reports to the core loop.
#[derive(Debug)]
pub enum NetEvent {
    /// A dialed peer completed its handshake.
    PeerOpen {
        /// The peer's registered address.
        pk: PublicKey,
    },
    /// A text frame arrived from a dialed peer.
    PeerMessage {
        /// The sending peer.
        pk: PublicKey,
        /// The raw frame.
        text: String,
    },
    /// A dial or transport failure on a peer connection.
    PeerError {
        /// The affected peer.
        pk: PublicKey,
        /// What went wrong.
        error: NetworkError,
    },
    /// A peer connection ended.
    PeerClose {
        /// The affected peer.
        pk: PublicKey,
    },
    /// An inbound connection completed its handshake.
    ClientOpen {
        /// The new connection's id.
        id: ClientId,
        /// The connection's outbound queue, for the client list.
        handle: OutboundHandle,
        /// The remote address, for the facade's events.
        addr: SocketAddr,
    },
    /// A text frame arrived from an accepted client.
    ClientMessage {
        /// The sending connection.
        id: ClientId,
        /// The raw frame.
        text: String,
    },
    /// A transport failure on an accepted client.
    ClientError {
        /// The affected connection.
        id: ClientId,
        /// What went wrong.
        error: NetworkError,
    },
    /// An accepted client connection ended.
    ClientClose {
        /// The affected connection.
        id: ClientId,
    },
}

enum Outbound {
    Frame(String),
    Shutdown,
}

/// A connection's outbound queue. Cloneable; enqueueing never blocks and
/// never fails loudly (a dead connection reports through its own events).
#[derive(Clone)]
pub struct OutboundHandle {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl OutboundHandle {
    /// Enqueues one text frame.
    pub fn send(&self, text: String) {
        let _ = self.tx.send(Outbound::Frame(text));
    }

    /// Asks the connection task to close cleanly.
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Shutdown);
    }
}

impl fmt::Debug for OutboundHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundHandle").finish_non_exhaustive()
    }
}

enum Endpoint {
    Peer(PublicKey),
    Client(ClientId),
}

impl Endpoint {
    fn message(&self, text: String) -> NetEvent {
        match self {
            Endpoint::Peer(pk) => NetEvent::PeerMessage {
                pk: pk.clone(),
                text,
            },
            Endpoint::Client(id) => NetEvent::ClientMessage { id: *id, text },
        }
    }

    fn error(&self, error: NetworkError) -> NetEvent {
        match self {
            Endpoint::Peer(pk) => NetEvent::PeerError {
                pk: pk.clone(),
                error,
            },
            Endpoint::Client(id) => NetEvent::ClientError { id: *id, error },
        }
    }

    fn close(&self) -> NetEvent {
        match self {
            Endpoint::Peer(pk) => NetEvent::PeerClose { pk: pk.clone() },
            Endpoint::Client(id) => NetEvent::ClientClose { id: *id },
        }
    }
}

/// Dials `url` for the peer registered as `pk`.
///
/// Returns the outbound queue immediately; frames enqueued before the
/// handshake completes are delivered once it does. Failures surface as
/// `PeerError`/`PeerClose` events.
pub fn dial(url: String, pk: PublicKey, events: mpsc::UnboundedSender<NetEvent>) -> OutboundHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_dialer(url, pk, rx, events));
    OutboundHandle { tx }
}

async fn run_dialer(
    url: String,
    pk: PublicKey,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<NetEvent>,
) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let _ = events.send(NetEvent::PeerError {
                pk: pk.clone(),
                error: NetworkError::Dial {
                    url,
                    reason: e.to_string(),
                },
            });
            let _ = events.send(NetEvent::PeerClose { pk });
            return;
        }
    };
    debug!(target: "networking", peer = pk.short(), url = %url, "peer connection open");
    let _ = events.send(NetEvent::PeerOpen { pk: pk.clone() });
    pump(stream, outbound, Endpoint::Peer(pk), &events).await;
}

/// A running acceptor. Dropping the handle does not stop it; the core calls
/// [`shutdown`](ListenerHandle::shutdown) when a new listener replaces it.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// The locally bound address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting new connections. Already-accepted connections keep
    /// running until they close on their own.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

/// Binds a listener on `port` and accepts inbound transports until
/// shut down.
pub async fn listen(
    port: u16,
    events: mpsc::UnboundedSender<NetEvent>,
) -> Result<ListenerHandle, NetworkError> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|e| NetworkError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;
    let local_addr = listener.local_addr().map_err(|e| NetworkError::Bind {
        addr,
        reason: e.to_string(),
    })?;
    debug!(target: "networking", addr = %local_addr, "listener bound");
    let task = tokio::spawn(run_listener(listener, events));
    Ok(ListenerHandle { local_addr, task })
}

async fn run_listener(listener: TcpListener, events: mpsc::UnboundedSender<NetEvent>) {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(target: "networking", "accept failed: {}", e);
                continue;
            }
        };
        let events = events.clone();
        tokio::spawn(async move {
            let id = ClientId::next();
            let stream = match accept_async(socket).await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = events.send(NetEvent::ClientError {
                        id,
                        error: NetworkError::Transport(format!("handshake failed: {}", e)),
                    });
                    let _ = events.send(NetEvent::ClientClose { id });
                    return;
                }
            };
            let (tx, rx) = mpsc::unbounded_channel();
            debug!(target: "networking", %id, %addr, "client connection open");
            let _ = events.send(NetEvent::ClientOpen {
                id,
                handle: OutboundHandle { tx },
                addr,
            });
            pump(stream, rx, Endpoint::Client(id), &events).await;
        });
    }
}

async fn pump<S>(
    stream: S,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    endpoint: Endpoint,
    events: &mpsc::UnboundedSender<NetEvent>,
) where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    let (mut sink, mut incoming) = stream.split();
    loop {
        tokio::select! {
            queued = outbound.recv() => match queued {
                Some(Outbound::Frame(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        let _ = events.send(
                            endpoint.error(NetworkError::Transport(e.to_string())),
                        );
                        break;
                    }
                }
                Some(Outbound::Shutdown) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = incoming.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(endpoint.message(text));
                }
                // Binary and control frames are not part of the wire.
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(
                        endpoint.error(NetworkError::Transport(e.to_string())),
                    );
                    break;
                }
            },
        }
    }
    let _ = events.send(endpoint.close());
}
