use std::time::SystemTime;

use actix_web::{web, HttpResponse};
use serde_derive::Deserialize;
use serde_json::json;

use super::{blocking, check_update_secret, path_slug};
use crate::{
    errors::{CommonError, ConflictKind, Fields, ServerError},
    models::note::EnvelopeFields,
    slug::Slug,
    store::{Replacement, SwapOutcome},
    token::{next_token, ModificationToken},
    AppState,
};

#[derive(Clone, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(flatten)]
    envelope: EnvelopeFields,
    update_secret: String,
    /// Decimal string; a JSON number is rejected before it can lose digits.
    modification_token: String,
}

/// An update request that passed validation.
pub struct UpdateNote {
    pub envelope: EnvelopeFields,
    pub update_secret: String,
    pub modification_token: ModificationToken,
}

impl UpdateNoteRequest {
    pub fn validate(self) -> Result<UpdateNote, ServerError> {
        let mut errors = self.envelope.validate();
        errors.extend(check_update_secret(&self.update_secret));
        let token = match self.modification_token.parse::<ModificationToken>() {
            Ok(token) => Some(token),
            Err(_) if self.modification_token.is_empty() => {
                errors.push(Fields::ModificationToken(CommonError::Empty));
                None
            }
            Err(_) => {
                errors.push(Fields::ModificationToken(CommonError::InvalidFormat));
                None
            }
        };

        match token {
            Some(modification_token) if errors.is_empty() => Ok(UpdateNote {
                envelope: self.envelope,
                update_secret: self.update_secret,
                modification_token,
            }),
            _ => Err(ServerError::UserError(errors)),
        }
    }
}

/// Look the note up, check the update secret, then swap. A wrong secret is
/// reported as such even when the token is also stale.
fn apply(
    state: &AppState,
    slug: &Slug,
    update: UpdateNote,
) -> Result<ModificationToken, ServerError> {
    let note = state.store.get(slug)?;

    if !state
        .authenticator
        .verify(&update.update_secret, &note.update_secret_hash)?
    {
        log::warn!("rejected update of '{slug}': wrong update secret");
        return Err(ServerError::Forbidden);
    }

    let replacement = Replacement {
        envelope: update.envelope,
        expected: update.modification_token,
        next: next_token(state.clock.as_ref(), update.modification_token),
        updated_at: SystemTime::now(),
    };

    match state.store.compare_and_swap(slug, &replacement)? {
        SwapOutcome::Swapped(token) => Ok(token),
        SwapOutcome::Stale => {
            log::warn!("rejected update of '{slug}': stale modification token");
            Err(ServerError::Conflict(ConflictKind::StaleToken))
        }
        SwapOutcome::Missing => Err(ServerError::NotFound(slug.to_string())),
    }
}

pub async fn update(
    note_slug: web::Path<String>,
    input: web::Json<UpdateNoteRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let slug = path_slug(&note_slug)?;
    let update = input.into_inner().validate()?;

    let worker_slug = slug.clone();
    let token = blocking(move || apply(&state, &worker_slug, update)).await?;

    log::info!("updated note '{slug}'");
    Ok(HttpResponse::Ok().json(json!({ "modification_token": token })))
}
