//! Errors produced while sealing or opening an envelope.

use thiserror::Error;

pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Which part of the envelope a decoding problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Ciphertext,
    Salt,
    Nonce,
}

impl std::fmt::Display for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Part::Ciphertext => write!(f, "ciphertext"),
            Part::Salt => write!(f, "salt"),
            Part::Nonce => write!(f, "nonce"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The field is not valid base64. Usually a transport problem, never a
    /// password problem.
    #[error("{part} is not valid base64: {source}")]
    Encoding {
        part: Part,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{part} must be {expected} bytes, got {actual}")]
    Length {
        part: Part,
        expected: usize,
        actual: usize,
    },

    #[error("{part} must be at least {minimum} bytes, got {actual}")]
    Truncated {
        part: Part,
        minimum: usize,
        actual: usize,
    },

    /// The authentication tag did not verify: wrong password, or the
    /// ciphertext, salt or nonce were altered.
    #[error("authentication failed: wrong password or corrupted note")]
    Authentication,

    #[error("decrypted note is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("encryption failed")]
    Encryption,
}

impl EnvelopeError {
    /// True when the failure means the password was wrong (or the data was
    /// tampered with), as opposed to a malformed envelope.
    pub fn is_authentication(&self) -> bool {
        matches!(self, EnvelopeError::Authentication)
    }
}
