//! Integration tests for the Keystash crypto module.

use keystash::crypto::{
    derive_key_with_params, generate_salt, key_fingerprint, open, password_verifier, seal,
    verify_password, Argon2Params, NONCE_LEN,
};
use keystash::errors::KeystashError;

fn fast() -> Argon2Params {
    Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn same_password_and_salt_give_same_key() {
    let salt = generate_salt();
    let a = derive_key_with_params(b"correct-horse-battery", &salt, &fast()).unwrap();
    let b = derive_key_with_params(b"correct-horse-battery", &salt, &fast()).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn different_salt_gives_different_key() {
    let a = derive_key_with_params(b"pw", &generate_salt(), &fast()).unwrap();
    let b = derive_key_with_params(b"pw", &generate_salt(), &fast()).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn weak_params_are_rejected() {
    let params = Argon2Params {
        memory_kib: 1_024,
        ..fast()
    };
    let result = derive_key_with_params(b"pw", &generate_salt(), &params);
    assert!(matches!(result, Err(KeystashError::KeyDerivationFailed(_))));
}

// ---------------------------------------------------------------------------
// Authenticated encryption
// ---------------------------------------------------------------------------

#[test]
fn seal_then_open_with_derived_key() {
    let key = derive_key_with_params(b"pw", &generate_salt(), &fast()).unwrap();
    let sealed = seal(b"{\"projects\":{}}", key.as_bytes()).unwrap();

    assert_eq!(sealed.len(), NONCE_LEN + 15 + 16);
    assert_eq!(open(&sealed, key.as_bytes()).unwrap(), b"{\"projects\":{}}");
}

#[test]
fn every_single_byte_flip_is_detected() {
    let key = [7u8; 32];
    let sealed = seal(b"sk_live_123", &key).unwrap();

    for i in 0..sealed.len() {
        let mut tampered = sealed.clone();
        tampered[i] ^= 0x01;
        assert!(
            matches!(open(&tampered, &key), Err(KeystashError::Authentication)),
            "flip at byte {i} was not detected"
        );
    }
}

#[test]
fn wrong_key_is_an_authentication_failure() {
    let sealed = seal(b"secret", &[1u8; 32]).unwrap();
    assert!(matches!(
        open(&sealed, &[2u8; 32]),
        Err(KeystashError::Authentication)
    ));
}

#[test]
fn truncated_input_is_an_authentication_failure() {
    assert!(matches!(
        open(&[0u8; NONCE_LEN], &[1u8; 32]),
        Err(KeystashError::Authentication)
    ));
}

// ---------------------------------------------------------------------------
// Verifier and fingerprint
// ---------------------------------------------------------------------------

#[test]
fn verifier_accepts_only_the_right_password() {
    let salt = generate_salt();
    let verifier = password_verifier(b"correct-horse-battery", &salt);

    assert!(verify_password(b"correct-horse-battery", &salt, &verifier));
    assert!(!verify_password(b"wrong", &salt, &verifier));
    assert!(!verify_password(b"correct-horse-battery", &salt, &verifier[..16]));
}

#[test]
fn fingerprint_is_not_the_key() {
    let key = [9u8; 32];
    let fp = key_fingerprint(&key);
    assert_ne!(fp, key);
    assert_eq!(fp, key_fingerprint(&key));
}
