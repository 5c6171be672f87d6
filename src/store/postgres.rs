//! Postgres note store.
//!
//! Slug uniqueness is the `notes_slug_key` constraint, and the conditional
//! replace is a single `UPDATE ... WHERE slug = $1 AND modification_token = $2`,
//! so neither path depends on a read made earlier in the request.

use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use super::{NoteStore, Replacement, SwapOutcome};
use crate::errors::{ConflictKind, ServerError};
use crate::models::note::{NewNote, Note};
use crate::schema::notes::dsl::{
    ciphertext, modification_token, nonce, notes, salt, slug as slug_column, updated_at,
};
use crate::slug::Slug;
use crate::token::ModificationToken;

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn connect(database_url: &str, max_size: u32) -> Result<Pool, ServerError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Ok(r2d2::Pool::builder().max_size(max_size).build(manager)?)
}

pub fn run_migrations(pool: &Pool) -> Result<(), ServerError> {
    let mut pooled = pool.get()?;
    let connection: &mut PgConnection = &mut pooled;
    let applied = connection.run_pending_migrations(MIGRATIONS).map_err(|e| {
        log::error!("{e}");
        ServerError::MigrationError
    })?;
    for version in applied {
        log::info!("applied migration {version}");
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgNoteStore {
    pool: Pool,
}

impl PgNoteStore {
    pub fn new(pool: Pool) -> PgNoteStore {
        PgNoteStore { pool }
    }
}

impl NoteStore for PgNoteStore {
    fn create(&self, note: NewNote) -> Result<Note, ServerError> {
        let mut connection = self.pool.get()?;

        match diesel::insert_into(notes)
            .values(&note)
            .returning(Note::as_returning())
            .get_result(&mut connection)
        {
            Ok(note) => Ok(note),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(ServerError::Conflict(ConflictKind::SlugTaken))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get(&self, slug: &Slug) -> Result<Note, ServerError> {
        let mut connection = self.pool.get()?;

        notes
            .filter(slug_column.eq(slug.as_str()))
            .select(Note::as_select())
            .first(&mut connection)
            .optional()?
            .ok_or_else(|| ServerError::NotFound(slug.to_string()))
    }

    fn compare_and_swap(
        &self,
        slug: &Slug,
        replacement: &Replacement,
    ) -> Result<SwapOutcome, ServerError> {
        let mut connection = self.pool.get()?;

        let swapped = diesel::update(
            notes
                .filter(slug_column.eq(slug.as_str()))
                .filter(modification_token.eq(replacement.expected.get())),
        )
        .set((
            ciphertext.eq(&replacement.envelope.ciphertext),
            salt.eq(&replacement.envelope.salt),
            nonce.eq(&replacement.envelope.nonce),
            modification_token.eq(replacement.next.get()),
            updated_at.eq(replacement.updated_at),
        ))
        .returning(modification_token)
        .get_result::<i64>(&mut connection)
        .optional()?;

        if let Some(token) = swapped {
            return Ok(SwapOutcome::Swapped(ModificationToken::from_stored(token)));
        }

        // Zero rows matched. Notes are never deleted, so this read can only
        // tell a stale token from an unknown slug, not race a writer.
        let present = diesel::select(exists(notes.filter(slug_column.eq(slug.as_str()))))
            .get_result::<bool>(&mut connection)?;
        Ok(if present {
            SwapOutcome::Stale
        } else {
            SwapOutcome::Missing
        })
    }
}
