//! Client-side envelope encryption for privatenote.
//!
//! A note is encrypted with AES-256-GCM under a key derived from the reader's
//! password with PBKDF2-HMAC-SHA256. The server only ever stores the resulting
//! [`Envelope`]; the password, the derived key and the plaintext stay in the
//! process that calls this crate. The server crate does not depend on this
//! one.

pub mod encryption;
pub mod error;
pub mod key_derivation;

pub use encryption::{decrypt, encrypt, Envelope, NONCE_SIZE, TAG_SIZE};
pub use error::{EnvelopeError, EnvelopeResult, Part};
pub use key_derivation::{PBKDF2_ROUNDS, SALT_SIZE};
