use std::time::SystemTime;

use base64::{engine::general_purpose::STANDARD, Engine};
use diesel::{Insertable, Queryable, Selectable};
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CommonError, Fields};
use crate::schema::notes;
use crate::slug::Slug;
use crate::token::ModificationToken;

pub const SALT_SIZE: usize = 16;
pub const NONCE_SIZE: usize = 12;
/// AES-GCM tag; no valid ciphertext is shorter.
pub const MIN_CIPHERTEXT_SIZE: usize = 16;

/// A stored note. Carries the update secret hash, so it is never serialized
/// back to a client as is.
#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name = notes)]
pub struct Note {
    pub id: Uuid,
    pub slug: String,
    pub ciphertext: String,
    pub salt: String,
    pub nonce: String,
    pub update_secret_hash: String,
    pub modification_token: i64,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Note {
    pub fn token(&self) -> ModificationToken {
        ModificationToken::from_stored(self.modification_token)
    }

    pub fn envelope(&self) -> EnvelopeFields {
        EnvelopeFields {
            ciphertext: self.ciphertext.clone(),
            salt: self.salt.clone(),
            nonce: self.nonce.clone(),
        }
    }
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = notes)]
pub struct NewNote {
    pub id: Uuid,
    pub slug: String,
    pub ciphertext: String,
    pub salt: String,
    pub nonce: String,
    pub update_secret_hash: String,
    pub modification_token: i64,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl NewNote {
    pub fn new(
        slug: &Slug,
        envelope: &EnvelopeFields,
        update_secret_hash: &str,
        token: ModificationToken,
    ) -> NewNote {
        let time_now = SystemTime::now();
        NewNote {
            id: Uuid::new_v4(),
            slug: slug.as_str().to_owned(),
            ciphertext: envelope.ciphertext.clone(),
            salt: envelope.salt.clone(),
            nonce: envelope.nonce.clone(),
            update_secret_hash: update_secret_hash.to_owned(),
            modification_token: token.get(),
            created_at: time_now,
            updated_at: time_now,
        }
    }

    pub fn into_note(self) -> Note {
        Note {
            id: self.id,
            slug: self.slug,
            ciphertext: self.ciphertext,
            salt: self.salt,
            nonce: self.nonce,
            update_secret_hash: self.update_secret_hash,
            modification_token: self.modification_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// The encrypted note as the client sent it. The server only checks that
/// each part is well-formed base64 of a plausible size; it never holds a key.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnvelopeFields {
    pub ciphertext: String,
    pub salt: String,
    pub nonce: String,
}

fn check_base64(
    value: &str,
    field: fn(CommonError) -> Fields,
    size_ok: impl Fn(usize) -> bool,
) -> Option<Fields> {
    if value.is_empty() {
        return Some(field(CommonError::Empty));
    }
    match STANDARD.decode(value) {
        Ok(bytes) if size_ok(bytes.len()) => None,
        Ok(_) => Some(field(CommonError::InvalidLength)),
        Err(_) => Some(field(CommonError::InvalidEncoding)),
    }
}

impl EnvelopeFields {
    pub fn validate(&self) -> Vec<Fields> {
        [
            check_base64(&self.ciphertext, Fields::Ciphertext, |len| {
                len >= MIN_CIPHERTEXT_SIZE
            }),
            check_base64(&self.salt, Fields::Salt, |len| len == SALT_SIZE),
            check_base64(&self.nonce, Fields::Nonce, |len| len == NONCE_SIZE),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
