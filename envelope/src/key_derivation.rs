//! PBKDF2-HMAC-SHA256 key derivation.

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

/// PBKDF2 iteration count. Browsers and the stored notes depend on this exact
/// value, it can only ever be raised together with a format change.
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// Salt size in bytes
pub const SALT_SIZE: usize = 16;

/// AES-256 key size in bytes
pub const KEY_SIZE: usize = 32;

/// A 256-bit key derived from a password. Wiped from memory on drop.
pub struct DerivedKey(Zeroizing<[u8; KEY_SIZE]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &*self.0
    }
}

pub(crate) fn fresh_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the note key for `password` under `salt`.
pub fn derive_key(password: &str, salt: &[u8; SALT_SIZE]) -> DerivedKey {
    derive_with_rounds(password.as_bytes(), salt, PBKDF2_ROUNDS)
}

fn derive_with_rounds(password: &[u8], salt: &[u8], rounds: u32) -> DerivedKey {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut key[..]);
    DerivedKey(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_password_and_salt_give_same_key() {
        let salt = fresh_salt();
        let a = derive_key("correct horse", &salt);
        let b = derive_key("correct horse", &salt);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salt_gives_different_key() {
        let a = derive_key("correct horse", &fresh_salt());
        let b = derive_key("correct horse", &fresh_salt());
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_password_gives_different_key() {
        let salt = fresh_salt();
        let a = derive_key("correct horse", &salt);
        let b = derive_key("battery staple", &salt);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn known_answer() {
        let key = derive_with_rounds(b"password", b"salt", 1);
        let expected: [u8; KEY_SIZE] = [
            0x12, 0x0f, 0xb6, 0xcf, 0xfc, 0xf8, 0xb3, 0x2c, 0x43, 0xe7, 0x22, 0x52, 0x56, 0xc4,
            0xf8, 0x37, 0xa8, 0x65, 0x48, 0xc9, 0x2c, 0xcc, 0x35, 0x48, 0x08, 0x05, 0x98, 0x7c,
            0xb7, 0x0b, 0xe1, 0x7b,
        ];
        assert_eq!(key.as_bytes(), &expected);
    }
}
