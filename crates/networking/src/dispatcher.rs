// Path: crates/networking/src/dispatcher.rs
//! Frame fan-out and inbound routing.
//!
//! Outbound: every engine frame goes to every registered peer and every
//! accepted client, wrapped in the `fba` envelope, fire-and-forget.
//! Inbound: only well-formed `fba` envelopes reach the engine; unknown tags
//! are dropped silently and garbage is logged as a parse failure.

use crate::registry::{ClientList, PeerRegistry};
use castnet_types::error::ErrorCode;
use castnet_types::wire::{self, Inbound};
use serde_json::Value;
use tracing::{debug, warn};

/// Enqueues `frame` on every connected transport, in peer-registration
/// order then client-accept order. Returns how many transports were
/// targeted.
pub fn fan_out(frame: &Value, peers: &PeerRegistry, clients: &ClientList) -> usize {
    let encoded = match wire::encode_fba(frame) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(target: "networking", code = e.code(), "failed to encode engine frame: {}", e);
            return 0;
        }
    };

    let mut targeted = 0;
    for (_, entry) in peers.iter() {
        entry.handle.send(encoded.clone());
        targeted += 1;
    }
    for (_, handle) in clients.iter() {
        handle.send(encoded.clone());
        targeted += 1;
    }
    debug!(target: "networking", targets = targeted, "fanned out engine frame");
    targeted
}

/// Routes one inbound text frame, returning the engine frame when the
/// envelope carries one. Unknown tags and malformed frames yield `None`;
/// only the latter is logged.
pub fn route_inbound(source: &str, text: &str) -> Option<Value> {
    match wire::decode(text) {
        Ok(Inbound::Fba(frame)) => Some(frame),
        Ok(Inbound::Ignored) => None,
        Err(e) => {
            warn!(
                target: "networking",
                %source, code = "parse_fail",
                "dropping malformed inbound frame: {}", e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inbound_routing_separates_fba_from_noise() {
        let frame = json!({"k": "nom"});
        let encoded = wire::encode_fba(&frame).unwrap();
        assert_eq!(route_inbound("test", &encoded), Some(frame));

        // Unknown tag: tolerated silently.
        assert_eq!(route_inbound("test", r#"{"t":"qry","sha":"aa"}"#), None);
        // Garbage: logged and dropped.
        assert_eq!(route_inbound("test", "not json"), None);
    }

    #[test]
    fn fan_out_with_nobody_connected_is_a_noop() {
        let peers = PeerRegistry::new();
        let clients = ClientList::new();
        assert_eq!(fan_out(&json!({"k": "nom"}), &peers, &clients), 0);
    }
}
