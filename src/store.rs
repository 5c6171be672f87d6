//! Note persistence.
//!
//! Stores expose exactly three operations: insert a new note, read one, and
//! replace a note's envelope if and only if its token still matches. There is
//! no unconditional update and no delete.

use std::time::SystemTime;

use crate::errors::ServerError;
use crate::models::note::{EnvelopeFields, NewNote, Note};
use crate::slug::Slug;
use crate::token::ModificationToken;

pub mod memory;
pub mod postgres;

/// A conditional replacement of a note's envelope.
#[derive(Clone, Debug)]
pub struct Replacement {
    pub envelope: EnvelopeFields,
    /// Token the writer last read.
    pub expected: ModificationToken,
    /// Token to store on success, strictly greater than `expected`.
    pub next: ModificationToken,
    pub updated_at: SystemTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    Swapped(ModificationToken),
    /// The note exists but carries a different token; nothing was written.
    Stale,
    Missing,
}

pub trait NoteStore: Send + Sync {
    /// Insert `note`. Fails with `Conflict(SlugTaken)` if the slug exists,
    /// decided atomically by the store.
    fn create(&self, note: NewNote) -> Result<Note, ServerError>;

    /// Fails with `NotFound` for an unknown slug.
    fn get(&self, slug: &Slug) -> Result<Note, ServerError>;

    /// Replace the envelope, token and `updated_at` of the note at `slug`
    /// in one atomic step, only if its stored token equals
    /// `replacement.expected`.
    fn compare_and_swap(
        &self,
        slug: &Slug,
        replacement: &Replacement,
    ) -> Result<SwapOutcome, ServerError>;
}
