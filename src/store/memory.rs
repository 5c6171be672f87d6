//! In-memory note store.
//!
//! Notes live in a `HashMap` behind a `Mutex`; each operation holds the lock
//! for its whole check-and-write, which makes `create` and
//! `compare_and_swap` atomic the same way the database constraint and
//! conditional `UPDATE` are. Nothing survives a restart, so this is used
//! for tests and local runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{NoteStore, Replacement, SwapOutcome};
use crate::errors::{ConflictKind, ServerError};
use crate::models::note::{NewNote, Note};
use crate::slug::Slug;

#[derive(Clone, Debug, Default)]
pub struct MemoryNoteStore {
    notes: Arc<Mutex<HashMap<String, Note>>>,
}

impl MemoryNoteStore {
    pub fn new() -> MemoryNoteStore {
        MemoryNoteStore::default()
    }

    // Every critical section either fully applies or changes nothing, so a
    // poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Note>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NoteStore for MemoryNoteStore {
    fn create(&self, note: NewNote) -> Result<Note, ServerError> {
        let mut notes = self.lock();
        if notes.contains_key(&note.slug) {
            return Err(ServerError::Conflict(ConflictKind::SlugTaken));
        }
        let note = note.into_note();
        notes.insert(note.slug.clone(), note.clone());
        Ok(note)
    }

    fn get(&self, slug: &Slug) -> Result<Note, ServerError> {
        self.lock()
            .get(slug.as_str())
            .cloned()
            .ok_or_else(|| ServerError::NotFound(slug.to_string()))
    }

    fn compare_and_swap(
        &self,
        slug: &Slug,
        replacement: &Replacement,
    ) -> Result<SwapOutcome, ServerError> {
        let mut notes = self.lock();
        let Some(note) = notes.get_mut(slug.as_str()) else {
            return Ok(SwapOutcome::Missing);
        };
        if note.modification_token != replacement.expected.get() {
            return Ok(SwapOutcome::Stale);
        }
        note.ciphertext = replacement.envelope.ciphertext.clone();
        note.salt = replacement.envelope.salt.clone();
        note.nonce = replacement.envelope.nonce.clone();
        note.modification_token = replacement.next.get();
        note.updated_at = replacement.updated_at;
        Ok(SwapOutcome::Swapped(replacement.next))
    }
}
