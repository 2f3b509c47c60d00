// Path: crates/types/src/id.rs
//! Tagged identifier newtypes.
//!
//! Every map in the node is keyed by one of these types rather than by a bare
//! `String`, so a channel name can never be confused with a public key or a
//! cast digest. The slot identifier composes all three; its canonical string
//! form is `channel ':' pubkey_base64 ':' sha_hex`, which is unambiguous
//! because channel names reject `':'` and the base64/hex alphabets cannot
//! contain it.

use crate::error::IdError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The reserved delimiter of the slot identifier grammar.
pub const SLOT_DELIMITER: char = ':';

/// A named, unordered bus on which casts are totally ordered per sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    /// Validates and wraps a channel name. Names may not contain `':'`.
    pub fn new(name: impl Into<String>) -> Result<Self, IdError> {
        let name = name.into();
        if name.contains(SLOT_DELIMITER) {
            return Err(IdError::ReservedDelimiter { value: name });
        }
        Ok(Self(name))
    }

    /// The channel name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node address: the standard-base64 encoding of an Ed25519 verifying key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    /// Wraps an already-encoded key. The encoding is checked where the key
    /// material is actually used (signature verification), not here.
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The base64 form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short prefix for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        self.0.get(..end).unwrap_or_default()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lowercase-hex SHA-256 digest. The empty digest marks the start of a
/// cast chain (no previous cast).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(String);

impl Sha {
    /// The empty digest: "no previous cast".
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wraps an already-encoded hex digest.
    pub fn from_hex(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Whether this is the empty digest.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a single consensus instance: one proposed cast by one sender on
/// one channel. Scoping the slot to the cast digest lets the node reclaim a
/// sender's previous slot as soon as a newer cast externalizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotId {
    /// The channel the cast was proposed on.
    pub channel: Channel,
    /// The address of the cast's issuer.
    pub sender: PublicKey,
    /// The digest of the proposed cast.
    pub sha: Sha,
}

impl SlotId {
    /// Composes a slot identifier from its parts.
    pub fn new(channel: Channel, sender: PublicKey, sha: Sha) -> Self {
        Self {
            channel,
            sender,
            sha,
        }
    }

    /// Parses the canonical `channel:pubkey:sha` form.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        let mut parts = value.split(SLOT_DELIMITER);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(channel), Some(sender), Some(sha), None) if !sender.is_empty() => Ok(Self {
                channel: Channel::new(channel).map_err(|_| IdError::MalformedSlotId {
                    value: value.to_string(),
                })?,
                sender: PublicKey::from_base64(sender),
                sha: Sha::from_hex(sha),
            }),
            _ => Err(IdError::MalformedSlotId {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.channel, self.sender, self.sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_rejects_delimiter() {
        assert!(Channel::new("updates").is_ok());
        assert!(Channel::new("a:b").is_err());
        assert!(Channel::new("").is_ok());
    }

    #[test]
    fn slot_id_roundtrip() {
        let slot = SlotId::new(
            Channel::new("test").unwrap(),
            PublicKey::from_base64("QUJDRA=="),
            Sha::from_hex("ab12"),
        );
        let parsed = SlotId::parse(&slot.to_string()).unwrap();
        assert_eq!(parsed, slot);
    }

    #[test]
    fn slot_id_rejects_wrong_arity() {
        assert!(SlotId::parse("only-one-part").is_err());
        assert!(SlotId::parse("a:b").is_err());
        assert!(SlotId::parse("a:b:c:d").is_err());
        assert!(SlotId::parse("chan::sha").is_err());
    }

    #[test]
    fn empty_sha_marks_chain_start() {
        assert!(Sha::empty().is_empty());
        assert!(!Sha::from_hex("00").is_empty());
        assert_eq!(Sha::default(), Sha::empty());
    }
}
