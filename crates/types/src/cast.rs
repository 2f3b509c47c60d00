// Path: crates/types/src/cast.rs
//! The unit of agreement.
//!
//! A cast is a signed, hash-chained record proposed for consensus on a
//! channel. Its digest is the canonical hash of `[prv, channel, pay]` and the
//! signature covers the ASCII bytes of that digest. Chain continuity (`prv`
//! pointing at the sender's previous externalized digest on the channel) is
//! an acceptance-time concern and is deliberately not part of this record's
//! own invariants.

use crate::codec;
use crate::error::CodecError;
use crate::id::{Channel, PublicKey, Sha, SlotId};
use serde::{Deserialize, Serialize};

/// A signed, hash-chained message proposed for agreement on a channel.
///
/// Wire form (the `value` of a consensus slot):
/// `{"sha": hex, "sig": base64, "prv": hex, "pay": string}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cast {
    /// The cast's identity: `H([prv, channel, pay])`.
    pub sha: Sha,
    /// Detached Ed25519 signature over the ASCII bytes of `sha`, base64.
    pub sig: String,
    /// Digest of the sender's previous cast on the same channel; empty for
    /// the first link of the chain.
    pub prv: Sha,
    /// The opaque application payload.
    pub pay: String,
}

impl Cast {
    /// Serializes the cast to its canonical JSON wire form.
    pub fn to_json(&self) -> Result<String, CodecError> {
        codec::to_json_canonical(self)
    }

    /// Parses a cast from its JSON wire form. Fails closed: any missing
    /// field or non-string field shape is an error.
    pub fn from_json(value: &str) -> Result<Self, CodecError> {
        codec::from_json_canonical(value)
    }

    /// The consensus slot this cast is proposed under.
    pub fn slot_id(&self, channel: Channel, sender: PublicKey) -> SlotId {
        SlotId::new(channel, sender, self.sha.clone())
    }
}

/// What a channel subscriber receives for every externalized cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The channel the cast was externalized on.
    pub channel: Channel,
    /// The issuer of the cast.
    pub sender: PublicKey,
    /// The externalized cast's digest.
    pub sha: Sha,
    /// The application payload.
    pub pay: String,
}
