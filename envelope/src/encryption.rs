//! AES-256-GCM sealing of note text.
//!
//! Every call to [`encrypt`] draws a new salt and a new nonce, so a key is
//! never used twice with the same nonce, even when a note is re-encrypted
//! with an unchanged password.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use serde_derive::{Deserialize, Serialize};

use crate::error::{EnvelopeError, EnvelopeResult, Part};
use crate::key_derivation::{derive_key, fresh_salt, DerivedKey, SALT_SIZE};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag appended to the ciphertext
pub const TAG_SIZE: usize = 16;

/// Everything needed to decrypt a note, given the password. Each field is
/// standard padded base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub ciphertext: String,
    pub salt: String,
    pub nonce: String,
}

fn cipher(key: &DerivedKey) -> EnvelopeResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| EnvelopeError::Encryption)
}

fn fresh_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

fn decode(value: &str, part: Part) -> EnvelopeResult<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|source| EnvelopeError::Encoding { part, source })
}

fn decode_fixed<const N: usize>(value: &str, part: Part) -> EnvelopeResult<[u8; N]> {
    let bytes = decode(value, part)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| EnvelopeError::Length {
        part,
        expected: N,
        actual: bytes.len(),
    })
}

/// Encrypt `plaintext` under a key derived from `password`.
pub fn encrypt(plaintext: &str, password: &str) -> EnvelopeResult<Envelope> {
    let salt = fresh_salt();
    let nonce = fresh_nonce();
    let key = derive_key(password, &salt);

    let ciphertext = cipher(&key)?
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| EnvelopeError::Encryption)?;

    Ok(Envelope {
        ciphertext: STANDARD.encode(ciphertext),
        salt: STANDARD.encode(salt),
        nonce: STANDARD.encode(nonce),
    })
}

/// Decrypt an envelope with `password`.
///
/// A wrong password surfaces as [`EnvelopeError::Authentication`]; malformed
/// fields surface as `Encoding`, `Length` or `Truncated` before any key is
/// derived.
pub fn decrypt(envelope: &Envelope, password: &str) -> EnvelopeResult<String> {
    let salt: [u8; SALT_SIZE] = decode_fixed(&envelope.salt, Part::Salt)?;
    let nonce: [u8; NONCE_SIZE] = decode_fixed(&envelope.nonce, Part::Nonce)?;
    let ciphertext = decode(&envelope.ciphertext, Part::Ciphertext)?;
    if ciphertext.len() < TAG_SIZE {
        return Err(EnvelopeError::Truncated {
            part: Part::Ciphertext,
            minimum: TAG_SIZE,
            actual: ciphertext.len(),
        });
    }

    let key = derive_key(password, &salt);
    let plaintext = cipher(&key)?
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| EnvelopeError::Authentication)?;

    Ok(String::from_utf8(plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flip_first_byte(field: &str) -> String {
        let mut bytes = STANDARD.decode(field).unwrap();
        bytes[0] ^= 0xFF;
        STANDARD.encode(bytes)
    }

    #[test]
    fn round_trip() {
        let envelope = encrypt("meet me at the usual place", "hunter2").unwrap();
        let plaintext = decrypt(&envelope, "hunter2").unwrap();
        assert_eq!(plaintext, "meet me at the usual place");
    }

    #[test]
    fn round_trip_empty_and_unicode() {
        for text in ["", "ノート 📝 with\nnewlines\tand tabs"] {
            let envelope = encrypt(text, "pässwörd").unwrap();
            assert_eq!(decrypt(&envelope, "pässwörd").unwrap(), text);
        }
    }

    #[test]
    fn wrong_password_is_an_authentication_failure() {
        let envelope = encrypt("secret", "right").unwrap();
        let err = decrypt(&envelope, "wrong").unwrap_err();
        assert!(err.is_authentication(), "{err:?}");
    }

    #[test]
    fn every_call_draws_fresh_salt_and_nonce() {
        let first = encrypt("same text", "same password").unwrap();
        let second = encrypt("same text", "same password").unwrap();
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn encoded_sizes() {
        let envelope = encrypt("abc", "pw").unwrap();
        assert_eq!(STANDARD.decode(&envelope.salt).unwrap().len(), SALT_SIZE);
        assert_eq!(STANDARD.decode(&envelope.nonce).unwrap().len(), NONCE_SIZE);
        assert_eq!(
            STANDARD.decode(&envelope.ciphertext).unwrap().len(),
            3 + TAG_SIZE
        );
    }

    #[test]
    fn tampering_with_any_part_fails_authentication() {
        let envelope = encrypt("do not touch", "pw").unwrap();

        let mut tampered = envelope.clone();
        tampered.ciphertext = flip_first_byte(&envelope.ciphertext);
        assert!(decrypt(&tampered, "pw").unwrap_err().is_authentication());

        let mut tampered = envelope.clone();
        tampered.nonce = flip_first_byte(&envelope.nonce);
        assert!(decrypt(&tampered, "pw").unwrap_err().is_authentication());

        let mut tampered = envelope;
        tampered.salt = flip_first_byte(&tampered.salt);
        assert!(decrypt(&tampered, "pw").unwrap_err().is_authentication());
    }

    #[test]
    fn malformed_fields_are_not_authentication_failures() {
        let envelope = encrypt("x", "pw").unwrap();

        let mut bad = envelope.clone();
        bad.ciphertext = "not base64!".to_string();
        let err = decrypt(&bad, "pw").unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::Encoding {
                part: Part::Ciphertext,
                ..
            }
        ));

        let mut bad = envelope.clone();
        bad.nonce = STANDARD.encode([0u8; 8]);
        let err = decrypt(&bad, "pw").unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::Length {
                part: Part::Nonce,
                expected: NONCE_SIZE,
                actual: 8
            }
        ));

        let mut bad = envelope;
        bad.ciphertext = STANDARD.encode([1u8; 4]);
        let err = decrypt(&bad, "pw").unwrap_err();
        assert!(matches!(err, EnvelopeError::Truncated { actual: 4, .. }));
    }
}
