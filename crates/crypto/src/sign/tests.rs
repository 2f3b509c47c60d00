// Path: crates/crypto/src/sign/tests.rs
use super::*;
use base64::Engine as _;

#[test]
fn sign_and_verify_roundtrip() {
    let keypair = Keypair::generate().unwrap();
    let message = b"Test message";

    let signature = keypair.sign_detached(message).unwrap();
    assert!(verify_detached(&keypair.public_key(), message, &signature));
}

#[test]
fn seeded_generation_is_deterministic() {
    let a = Keypair::from_seed_phrase("test seed").unwrap();
    let b = Keypair::from_seed_phrase("test seed").unwrap();
    assert_eq!(a.public_key(), b.public_key());

    // Ed25519 signatures are deterministic, so identical keys sign identically.
    let message = b"determinism";
    assert_eq!(
        a.sign_detached(message).unwrap(),
        b.sign_detached(message).unwrap()
    );

    let other = Keypair::from_seed_phrase("another seed").unwrap();
    assert_ne!(a.public_key(), other.public_key());
}

#[test]
fn secret_export_restores_the_same_identity() {
    let original = Keypair::generate().unwrap();
    let restored = Keypair::from_secret_b64(&original.secret_b64()).unwrap();
    assert_eq!(original.public_key(), restored.public_key());

    let message = b"persistence";
    let signature = restored.sign_detached(message).unwrap();
    assert!(verify_detached(&original.public_key(), message, &signature));
}

#[test]
fn wrong_key_fails() {
    let signer = Keypair::generate().unwrap();
    let other = Keypair::generate().unwrap();
    let message = b"Test message";

    let signature = signer.sign_detached(message).unwrap();
    assert!(!verify_detached(&other.public_key(), message, &signature));
}

#[test]
fn tampered_message_fails() {
    let keypair = Keypair::generate().unwrap();
    let signature = keypair.sign_detached(b"Original message").unwrap();
    assert!(!verify_detached(
        &keypair.public_key(),
        b"Tampered message",
        &signature
    ));
}

#[test]
fn malformed_material_fails_closed() {
    let keypair = Keypair::generate().unwrap();
    let message = b"Test message";
    let signature = keypair.sign_detached(message).unwrap();

    // Not base64 at all.
    assert!(!verify_detached(&keypair.public_key(), message, "@@@"));
    // Valid base64, wrong length.
    assert!(!verify_detached(&keypair.public_key(), message, "QUJD"));
    // Garbage key.
    let bogus = castnet_types::PublicKey::from_base64("not-base64!");
    assert!(!verify_detached(&bogus, message, &signature));
}

#[test]
fn flipped_signature_bit_fails() {
    let keypair = Keypair::generate().unwrap();
    let message = b"Test message";
    let signature = keypair.sign_detached(message).unwrap();

    let mut bytes = base64::engine::general_purpose::STANDARD
        .decode(&signature)
        .unwrap();
    bytes[0] ^= 0x01;
    let tampered = base64::engine::general_purpose::STANDARD.encode(&bytes);
    assert!(!verify_detached(&keypair.public_key(), message, &tampered));
}
