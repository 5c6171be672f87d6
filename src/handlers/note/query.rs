use actix_web::{http::header, web, HttpResponse};
use serde_derive::Serialize;

use super::{blocking, path_slug};
use crate::{
    errors::ServerError, models::note::EnvelopeFields, token::ModificationToken, AppState,
};

/// What a reader gets back: the envelope and the token to present on the
/// next update. The update secret hash stays on the server.
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    #[serde(flatten)]
    pub envelope: EnvelopeFields,
    pub modification_token: ModificationToken,
}

pub async fn get(
    note_slug: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let slug = path_slug(&note_slug)?;

    let note = blocking(move || state.store.get(&slug)).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(NoteResponse {
            envelope: note.envelope(),
            modification_token: note.token(),
        }))
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::Value;

    use super::*;

    #[test]
    fn response_carries_no_hash_and_a_string_token() {
        let response = NoteResponse {
            envelope: EnvelopeFields {
                ciphertext: STANDARD.encode([5u8; 20]),
                salt: STANDARD.encode([1u8; 16]),
                nonce: STANDARD.encode([2u8; 12]),
            },
            modification_token: ModificationToken::from_stored(638_861_234_567_890_123),
        };
        let value = serde_json::to_value(&response).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["ciphertext", "modification_token", "nonce", "salt"]);
        assert_eq!(
            object["modification_token"],
            Value::String("638861234567890123".to_string())
        );
    }
}
