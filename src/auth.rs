//! Update secret hashing and verification.
//!
//! The update secret gates writes and is unrelated to the password that
//! encrypts the note. Only an Argon2id PHC string is stored, salted per note
//! and optionally peppered with the server's `SECRET_KEY`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::errors::ServerError;

#[derive(Clone)]
pub struct UpdateAuthenticator {
    pepper: Option<Vec<u8>>,
    params: Params,
}

impl UpdateAuthenticator {
    pub fn new(pepper: Option<Vec<u8>>) -> UpdateAuthenticator {
        UpdateAuthenticator::with_params(pepper, Params::default())
    }

    pub fn with_params(pepper: Option<Vec<u8>>, params: Params) -> UpdateAuthenticator {
        UpdateAuthenticator { pepper, params }
    }

    fn argon2(&self) -> Result<Argon2<'_>, ServerError> {
        match &self.pepper {
            Some(secret) => Ok(Argon2::new_with_secret(
                secret,
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )?),
            None => Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )),
        }
    }

    /// Slow. Call from the blocking pool.
    pub fn hash(&self, update_secret: &str) -> Result<String, ServerError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2()?
            .hash_password(update_secret.as_bytes(), &salt)?
            .to_string())
    }

    /// `Ok(false)` for a wrong secret; `Err` only when the stored hash itself
    /// is unusable. Slow. Call from the blocking pool.
    pub fn verify(&self, update_secret: &str, stored_hash: &str) -> Result<bool, ServerError> {
        let parsed_hash = PasswordHash::new(stored_hash)?;
        match self
            .argon2()?
            .verify_password(update_secret.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
pub(crate) fn fast_authenticator() -> UpdateAuthenticator {
    let params = Params::new(Params::MIN_M_COST * 8, 1, 1, None).unwrap();
    UpdateAuthenticator::with_params(None, params)
}
