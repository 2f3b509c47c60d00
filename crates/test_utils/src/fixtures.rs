// Path: crates/test_utils/src/fixtures.rs
//! Deterministic test identities.
//!
//! Seed-phrase derived, so every test run and every test process sees the
//! same keys without sharing state.

use castnet_crypto::{CryptoError, Keypair};

/// A deterministic keypair for the given fixture name.
pub fn keypair(name: &str) -> Result<Keypair, CryptoError> {
    Keypair::from_seed_phrase(format!("castnet-test-fixture::{}", name))
}

/// The first of the three canonical test identities.
pub fn alice() -> Result<Keypair, CryptoError> {
    keypair("alice")
}

/// The second canonical test identity.
pub fn bob() -> Result<Keypair, CryptoError> {
    keypair("bob")
}

/// The third canonical test identity.
pub fn carol() -> Result<Keypair, CryptoError> {
    keypair("carol")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_are_stable_and_distinct() {
        assert_eq!(
            alice().unwrap().public_key(),
            alice().unwrap().public_key()
        );
        assert_ne!(alice().unwrap().public_key(), bob().unwrap().public_key());
        assert_ne!(bob().unwrap().public_key(), carol().unwrap().public_key());
    }
}
