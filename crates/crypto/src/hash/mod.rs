// Path: crates/crypto/src/hash/mod.rs
//! Cryptographic hash functions using dcrypt.
//!
//! The canonical string-array hash is the identity function for casts:
//! `hash_parts(&[prv, channel, pay])` produces the `sha` field. The encoding
//! is the compact JSON array of the parts (UTF-8, no whitespace), which is
//! unambiguous for any part contents, hashed with SHA-256 and rendered as
//! lowercase hex. Test vectors below pin the encoding.

use crate::error::CryptoError;
use castnet_types::Sha;
use dcrypt::algorithms::hash::sha2::Sha256 as DcryptSha256;
use dcrypt::algorithms::hash::HashFunction as DcryptHashFunction;
use dcrypt::algorithms::ByteSerializable;

/// SHA-256 of arbitrary bytes.
pub fn sha256<T: AsRef<[u8]>>(data: T) -> Result<[u8; 32], CryptoError> {
    let digest = DcryptSha256::digest(data.as_ref()).map_err(dcrypt::Error::from)?;
    digest
        .to_bytes()
        .try_into()
        .map_err(|bytes: Vec<u8>| CryptoError::InvalidHashLength {
            expected: 32,
            got: bytes.len(),
        })
}

/// SHA-256 of arbitrary bytes, rendered as lowercase hex.
pub fn sha256_hex<T: AsRef<[u8]>>(data: T) -> Result<String, CryptoError> {
    Ok(hex::encode(sha256(data)?))
}

/// The canonical string-array hash: lowercase-hex SHA-256 of the compact
/// JSON array encoding of `parts`.
pub fn hash_parts(parts: &[&str]) -> Result<Sha, CryptoError> {
    let encoded = serde_json::to_string(parts)
        .map_err(|e| CryptoError::OperationFailed(format!("canonical encoding failed: {}", e)))?;
    Ok(Sha::from_hex(sha256_hex(encoded.as_bytes())?))
}

#[cfg(test)]
mod tests;
