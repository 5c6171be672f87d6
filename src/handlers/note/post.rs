use actix_web::{http::header, web, HttpResponse};
use serde_derive::Deserialize;
use serde_json::json;

use super::{blocking, check_update_secret};
use crate::{
    errors::{ConflictKind, Fields, ServerError},
    models::note::{EnvelopeFields, NewNote, Note},
    slug::{SlugAllocator, SlugRequest},
    store::NoteStore,
    token::{initial_token, ModificationToken},
    AppState,
};

/// How many fresh slugs to try when a generated one is already taken.
pub const GENERATED_SLUG_ATTEMPTS: usize = 5;

#[derive(Clone, Deserialize)]
pub struct NewNoteRequest {
    slug: Option<String>,
    #[serde(flatten)]
    envelope: EnvelopeFields,
    update_secret: String,
}

/// A create request that passed validation.
pub struct CreateNote {
    pub slug: SlugRequest,
    pub envelope: EnvelopeFields,
    pub update_secret: String,
}

impl NewNoteRequest {
    pub fn validate(self) -> Result<CreateNote, ServerError> {
        let mut errors = vec![];
        let slug = match SlugRequest::from_input(self.slug.as_deref()) {
            Ok(slug) => Some(slug),
            Err(err) => {
                errors.push(Fields::Slug(err));
                None
            }
        };
        errors.extend(self.envelope.validate());
        errors.extend(check_update_secret(&self.update_secret));

        match slug {
            Some(slug) if errors.is_empty() => Ok(CreateNote {
                slug,
                envelope: self.envelope,
                update_secret: self.update_secret,
            }),
            _ => Err(ServerError::UserError(errors)),
        }
    }
}

fn insert(
    store: &dyn NoteStore,
    slugs: &dyn SlugAllocator,
    slug: SlugRequest,
    envelope: &EnvelopeFields,
    update_secret_hash: &str,
    token: ModificationToken,
) -> Result<Note, ServerError> {
    match slug {
        SlugRequest::Custom(slug) => {
            store.create(NewNote::new(&slug, envelope, update_secret_hash, token))
        }
        SlugRequest::Allocate => {
            let mut attempt = 1;
            loop {
                let slug = slugs.allocate();
                match store.create(NewNote::new(&slug, envelope, update_secret_hash, token)) {
                    Err(ServerError::Conflict(ConflictKind::SlugTaken))
                        if attempt < GENERATED_SLUG_ATTEMPTS =>
                    {
                        log::warn!("generated slug '{slug}' is taken, retrying");
                        attempt += 1;
                    }
                    result => break result,
                }
            }
        }
    }
}

pub async fn new(
    input: web::Json<NewNoteRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let CreateNote {
        slug,
        envelope,
        update_secret,
    } = input.into_inner().validate()?;

    let authenticator = state.authenticator.clone();
    let update_secret_hash = blocking(move || authenticator.hash(&update_secret)).await?;

    let token = initial_token(state.clock.as_ref());
    let worker_state = state.clone();
    let note = blocking(move || {
        insert(
            worker_state.store.as_ref(),
            worker_state.slugs.as_ref(),
            slug,
            &envelope,
            &update_secret_hash,
            token,
        )
    })
    .await
    .map_err(|err| {
        if let ServerError::Conflict(ConflictKind::SlugTaken) = err {
            log::info!("rejected create, slug already exists");
        }
        err
    })?;

    log::info!("created note '{}'", note.slug);
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/notes/{}", note.slug)))
        .json(json!({
            "slug": note.slug,
            "modification_token": note.token(),
        })))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use base64::{engine::general_purpose::STANDARD, Engine};

    use super::*;
    use crate::errors::CommonError;
    use crate::slug::Slug;
    use crate::store::memory::MemoryNoteStore;

    fn envelope() -> EnvelopeFields {
        EnvelopeFields {
            ciphertext: STANDARD.encode([3u8; 24]),
            salt: STANDARD.encode([1u8; 16]),
            nonce: STANDARD.encode([2u8; 12]),
        }
    }

    fn request(slug: Option<&str>, update_secret: &str) -> NewNoteRequest {
        NewNoteRequest {
            slug: slug.map(str::to_owned),
            envelope: envelope(),
            update_secret: update_secret.to_owned(),
        }
    }

    /// Hands out a fixed sequence of slugs.
    struct Scripted(Mutex<Vec<&'static str>>);

    impl SlugAllocator for Scripted {
        fn allocate(&self) -> Slug {
            Slug::parse(self.0.lock().unwrap().remove(0)).unwrap()
        }
    }

    #[test]
    fn validate_accepts_and_normalizes() {
        let create = request(Some(" MyNote "), "w").validate().unwrap();
        assert_eq!(
            create.slug,
            SlugRequest::Custom(Slug::parse("mynote").unwrap())
        );
        let create = request(None, "w").validate().unwrap();
        assert_eq!(create.slug, SlugRequest::Allocate);
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut bad = request(Some("no spaces"), "");
        bad.envelope.nonce = STANDARD.encode([0u8; 3]);
        match bad.validate() {
            Err(ServerError::UserError(fields)) => assert_eq!(
                fields,
                vec![
                    Fields::Slug(CommonError::InvalidFormat),
                    Fields::Nonce(CommonError::InvalidLength),
                    Fields::UpdateSecret(CommonError::Empty),
                ]
            ),
            _ => panic!("expected a validation error"),
        }
    }

    #[test]
    fn overlong_update_secret_is_rejected() {
        let long = "x".repeat(crate::handlers::note::MAX_UPDATE_SECRET_LENGTH + 1);
        assert!(matches!(
            request(None, &long).validate(),
            Err(ServerError::UserError(fields)) if fields == vec![Fields::UpdateSecret(CommonError::TooLong)]
        ));
    }

    #[test]
    fn generated_slug_collisions_are_retried() {
        let store = MemoryNoteStore::new();
        let taken = Slug::parse("aaaaaaaa").unwrap();
        store
            .create(NewNote::new(&taken, &envelope(), "h", ModificationToken::FIRST))
            .unwrap();

        let slugs = Scripted(Mutex::new(vec!["aaaaaaaa", "aaaaaaaa", "bbbbbbbb"]));
        let note = insert(
            &store,
            &slugs,
            SlugRequest::Allocate,
            &envelope(),
            "h2",
            ModificationToken::FIRST,
        )
        .unwrap();
        assert_eq!(note.slug, "bbbbbbbb");
    }

    #[test]
    fn generated_slug_retries_are_bounded() {
        let store = MemoryNoteStore::new();
        let taken = Slug::parse("aaaaaaaa").unwrap();
        store
            .create(NewNote::new(&taken, &envelope(), "h", ModificationToken::FIRST))
            .unwrap();

        let slugs = Scripted(Mutex::new(vec!["aaaaaaaa"; GENERATED_SLUG_ATTEMPTS + 1]));
        let err = insert(
            &store,
            &slugs,
            SlugRequest::Allocate,
            &envelope(),
            "h2",
            ModificationToken::FIRST,
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::Conflict(ConflictKind::SlugTaken)));
        assert_eq!(slugs.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn custom_slug_collision_is_never_renamed() {
        let store = MemoryNoteStore::new();
        let taken = Slug::parse("mine").unwrap();
        store
            .create(NewNote::new(&taken, &envelope(), "h", ModificationToken::FIRST))
            .unwrap();

        let slugs = Scripted(Mutex::new(vec!["other"]));
        let err = insert(
            &store,
            &slugs,
            SlugRequest::Custom(taken),
            &envelope(),
            "h2",
            ModificationToken::FIRST,
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::Conflict(ConflictKind::SlugTaken)));
        assert_eq!(slugs.0.lock().unwrap().len(), 1);
    }
}
