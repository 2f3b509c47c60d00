// Path: crates/consensus/src/cast.rs
//! Cast construction and validation.
//!
//! Casts are the only thing the node ever agrees on, and their integrity is
//! never assumed: every externalized value is re-verified here before it can
//! touch the store or reach a subscriber.

use castnet_crypto::{hash_parts, verify_detached, CryptoError, Keypair};
use castnet_types::{Cast, Channel, PublicKey, Sha};

/// Builds and signs a cast for `payload` on `channel`, chained to `prv`
/// (empty for the first link). Never touches the store.
pub fn generate_cast(
    keypair: &Keypair,
    channel: &Channel,
    prv: &Sha,
    payload: &str,
) -> Result<Cast, CryptoError> {
    let sha = hash_parts(&[prv.as_str(), channel.as_str(), payload])?;
    let sig = keypair.sign_detached(sha.as_str().as_bytes())?;
    Ok(Cast {
        sha,
        sig,
        prv: prv.clone(),
        pay: payload.to_string(),
    })
}

/// Whether `cast` is internally sound: its digest recomputes from
/// `[prv, channel, pay]` and its signature verifies under `sender`.
///
/// Fails closed on any failure, including hashing errors. Chain continuity
/// is not checked here; that is the acceptor's concern.
pub fn verify_cast(sender: &PublicKey, channel: &Channel, cast: &Cast) -> bool {
    let Ok(expected) = hash_parts(&[cast.prv.as_str(), channel.as_str(), &cast.pay]) else {
        return false;
    };
    if expected != cast.sha {
        return false;
    }
    verify_detached(sender, cast.sha.as_str().as_bytes(), &cast.sig)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> Channel {
        Channel::new("test").unwrap()
    }

    #[test]
    fn generated_casts_verify() {
        let keypair = Keypair::from_seed_phrase("cast-model").unwrap();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "foo bar").unwrap();

        assert_eq!(
            cast.sha,
            hash_parts(&["", "test", "foo bar"]).unwrap(),
            "digest covers [prv, channel, pay]"
        );
        assert!(verify_cast(&keypair.public_key(), &channel(), &cast));
    }

    #[test]
    fn digest_binds_the_channel() {
        let keypair = Keypair::from_seed_phrase("cast-model").unwrap();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "foo bar").unwrap();

        let other = Channel::new("other").unwrap();
        assert!(!verify_cast(&keypair.public_key(), &other, &cast));
    }

    #[test]
    fn tampering_any_field_refuses() {
        let keypair = Keypair::from_seed_phrase("cast-model").unwrap();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "foo bar").unwrap();
        let me = keypair.public_key();

        let mut tampered = cast.clone();
        tampered.pay = "foo baz".to_string();
        assert!(!verify_cast(&me, &channel(), &tampered));

        let mut tampered = cast.clone();
        tampered.prv = Sha::from_hex("00");
        assert!(!verify_cast(&me, &channel(), &tampered));

        let mut tampered = cast.clone();
        let mut sha = tampered.sha.as_str().to_string();
        // Flip the first nibble.
        let flipped = if sha.starts_with('0') { "1" } else { "0" };
        sha.replace_range(0..1, flipped);
        tampered.sha = Sha::from_hex(sha);
        assert!(!verify_cast(&me, &channel(), &tampered));

        let mut tampered = cast.clone();
        tampered.sig = keypair.sign_detached(b"something else").unwrap();
        assert!(!verify_cast(&me, &channel(), &tampered));
    }

    #[test]
    fn wrong_sender_refuses() {
        let keypair = Keypair::from_seed_phrase("cast-model").unwrap();
        let other = Keypair::from_seed_phrase("someone else").unwrap();
        let cast = generate_cast(&keypair, &channel(), &Sha::empty(), "foo bar").unwrap();
        assert!(!verify_cast(&other.public_key(), &channel(), &cast));
    }

    #[test]
    fn chained_cast_digest_covers_prv() {
        let keypair = Keypair::from_seed_phrase("cast-model").unwrap();
        let first = generate_cast(&keypair, &channel(), &Sha::empty(), "one").unwrap();
        let second = generate_cast(&keypair, &channel(), &first.sha, "two").unwrap();

        assert_eq!(second.prv, first.sha);
        assert_ne!(second.sha, first.sha);
        assert!(verify_cast(&keypair.public_key(), &channel(), &second));
    }
}
