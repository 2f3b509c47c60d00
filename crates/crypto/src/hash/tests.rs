// Path: crates/crypto/src/hash/tests.rs
use super::*;

// Vectors computed independently over the pinned encoding: the compact JSON
// array of the parts, UTF-8, hashed with SHA-256.
#[test]
fn pinned_vectors() {
    assert_eq!(
        hash_parts(&[]).unwrap().as_str(),
        "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
    );
    assert_eq!(
        hash_parts(&[""]).unwrap().as_str(),
        "055539df4a0b804c58caf46c0cd2941af10d64c1395ddd8e50b5f55d945841e6"
    );
    assert_eq!(
        hash_parts(&["", "test", "foo bar"]).unwrap().as_str(),
        "722b17faf53b5e968439c9c361bc1fa2d1c7027cc6358c0bb452097c8239acc9"
    );
}

#[test]
fn encoding_is_unambiguous_across_part_boundaries() {
    // Concatenation-equal inputs must not collide.
    assert_ne!(
        hash_parts(&["ab", "c"]).unwrap(),
        hash_parts(&["a", "bc"]).unwrap()
    );
    assert_ne!(hash_parts(&["abc"]).unwrap(), hash_parts(&["abc", ""]).unwrap());
}

#[test]
fn digest_is_lowercase_hex() {
    let digest = hash_parts(&["prv", "chan", "pay"]).unwrap();
    assert_eq!(digest.as_str().len(), 64);
    assert!(digest
        .as_str()
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn sha256_matches_known_vector() {
    // SHA-256 of the empty input.
    assert_eq!(
        sha256_hex([]).unwrap(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}
