// Path: crates/crypto/src/sign/mod.rs
//! Ed25519 identities and detached signatures using dcrypt.
//!
//! A node's address is the base64 encoding of its verifying key; the secret
//! export is the base64 encoding of the 32-byte seed, so a keypair restored
//! from its export signs identically. Seeded generation is deterministic,
//! which the test fixtures rely on.

use crate::error::CryptoError;
use crate::hash::sha256;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use castnet_types::PublicKey;
use dcrypt::api::Signature as _;
use dcrypt::sign::eddsa::{self, Ed25519PublicKey, Ed25519SecretKey, Ed25519Signature};
use rand::rngs::OsRng;

/// An Ed25519 keypair: the node's identity.
#[derive(Clone)]
pub struct Keypair {
    public: Ed25519PublicKey,
    secret: Ed25519SecretKey,
}

impl Keypair {
    /// Generates a fresh keypair from the operating system RNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut rng = OsRng;
        let (public, secret) = eddsa::Ed25519::keypair(&mut rng).map_err(CryptoError::from)?;
        Ok(Self { public, secret })
    }

    /// Rebuilds a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = Ed25519SecretKey::from_seed(seed).map_err(|e| {
            CryptoError::InvalidKey(format!("failed to build secret key from seed: {:?}", e))
        })?;
        let public = secret.public_key().map_err(CryptoError::from)?;
        Ok(Self { public, secret })
    }

    /// Rebuilds a keypair deterministically from a seed phrase; the seed is
    /// the SHA-256 of the phrase bytes.
    pub fn from_seed_phrase(phrase: impl AsRef<[u8]>) -> Result<Self, CryptoError> {
        Self::from_seed(&sha256(phrase)?)
    }

    /// Restores a keypair from the base64 seed produced by [`secret_b64`].
    ///
    /// [`secret_b64`]: Keypair::secret_b64
    pub fn from_secret_b64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidKey(format!("secret is not base64: {}", e)))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            CryptoError::InvalidKey(format!("expected 32-byte seed, got {}", bytes.len()))
        })?;
        Self::from_seed(&seed)
    }

    /// The node address: base64 of the verifying key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_base64(BASE64.encode(self.public.to_bytes()))
    }

    /// The secret export: base64 of the 32-byte seed.
    pub fn secret_b64(&self) -> String {
        BASE64.encode(self.secret.seed())
    }

    /// Signs a message, returning the detached signature in base64.
    pub fn sign_detached(&self, message: &[u8]) -> Result<String, CryptoError> {
        let signature = eddsa::Ed25519::sign(message, &self.secret).map_err(CryptoError::from)?;
        Ok(BASE64.encode(signature.to_bytes()))
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secret material.
        f.debug_struct("Keypair")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Verifies a detached base64 signature under a base64 public key.
///
/// Fails closed: any decoding failure of the key or signature is a refusal,
/// never an error.
pub fn verify_detached(public_key: &PublicKey, message: &[u8], signature_b64: &str) -> bool {
    let Ok(key_bytes) = BASE64.decode(public_key.as_str()) else {
        return false;
    };
    let Ok(key) = Ed25519PublicKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = BASE64.decode(signature_b64) else {
        return false;
    };
    let Ok(signature) = Ed25519Signature::from_bytes(&sig_bytes) else {
        return false;
    };
    eddsa::Ed25519::verify(message, &signature, &key).is_ok()
}

#[cfg(test)]
mod tests;
