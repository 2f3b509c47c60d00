// Path: crates/networking/tests/ws_roundtrip.rs
//! Dialer/listener lifecycle over real sockets.

use castnet_networking::{dial, listen, NetEvent};
use castnet_types::PublicKey;
use std::time::Duration;
use tokio::sync::mpsc;

async fn next(events: &mut mpsc::UnboundedReceiver<NetEvent>) -> NetEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a transport event")
        .expect("event channel closed")
}

#[tokio::test]
async fn dial_listen_exchange_and_close() {
    let (server_tx, mut server_events) = mpsc::unbounded_channel();
    let listener = listen(0, server_tx).await.unwrap();
    let url = format!("ws://127.0.0.1:{}", listener.local_addr().port());

    let (client_tx, mut client_events) = mpsc::unbounded_channel();
    let pk = PublicKey::from_base64("cGs=");
    let peer = dial(url, pk.clone(), client_tx);

    // Both sides observe the open.
    match next(&mut client_events).await {
        NetEvent::PeerOpen { pk: opened } => assert_eq!(opened, pk),
        other => panic!("expected PeerOpen, got {:?}", other),
    }
    let (client_id, server_handle) = match next(&mut server_events).await {
        NetEvent::ClientOpen { id, handle, .. } => (id, handle),
        other => panic!("expected ClientOpen, got {:?}", other),
    };

    // Text frames travel both ways.
    peer.send("hello".to_string());
    match next(&mut server_events).await {
        NetEvent::ClientMessage { id, text } => {
            assert_eq!(id, client_id);
            assert_eq!(text, "hello");
        }
        other => panic!("expected ClientMessage, got {:?}", other),
    }
    server_handle.send("world".to_string());
    match next(&mut client_events).await {
        NetEvent::PeerMessage { pk: from, text } => {
            assert_eq!(from, pk);
            assert_eq!(text, "world");
        }
        other => panic!("expected PeerMessage, got {:?}", other),
    }

    // A clean close is observed on both sides.
    peer.close();
    match next(&mut client_events).await {
        NetEvent::PeerClose { pk: closed } => assert_eq!(closed, pk),
        other => panic!("expected PeerClose, got {:?}", other),
    }
    loop {
        match next(&mut server_events).await {
            NetEvent::ClientClose { id } => {
                assert_eq!(id, client_id);
                break;
            }
            // A transport error racing the close is tolerated.
            NetEvent::ClientError { .. } => {}
            other => panic!("expected ClientClose, got {:?}", other),
        }
    }

    listener.shutdown();
}

#[tokio::test]
async fn dialing_nobody_reports_error_then_close() {
    let (client_tx, mut client_events) = mpsc::unbounded_channel();
    let pk = PublicKey::from_base64("cGs=");
    // A port nobody listens on.
    let _peer = dial("ws://127.0.0.1:1".to_string(), pk.clone(), client_tx);

    match next(&mut client_events).await {
        NetEvent::PeerError { pk: failed, .. } => assert_eq!(failed, pk),
        other => panic!("expected PeerError, got {:?}", other),
    }
    match next(&mut client_events).await {
        NetEvent::PeerClose { pk: closed } => assert_eq!(closed, pk),
        other => panic!("expected PeerClose, got {:?}", other),
    }
}
