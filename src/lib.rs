//! Zero-knowledge note storage.
//!
//! Clients encrypt notes before they reach this server, which stores the
//! opaque envelope and guards writes with an update secret and a
//! modification token. Concurrent writers are serialized by a single
//! compare-and-swap in the store, never by a lock held across requests.

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod slug;
pub mod store;
pub mod token;

use auth::UpdateAuthenticator;
use slug::{RandomSlugs, SlugAllocator};
use store::NoteStore;
use token::{SystemClock, TokenClock};

/// Shared by every worker; holds no per-request state.
pub struct AppState {
    pub store: Arc<dyn NoteStore>,
    pub authenticator: UpdateAuthenticator,
    pub clock: Arc<dyn TokenClock>,
    pub slugs: Arc<dyn SlugAllocator>,
}

impl AppState {
    pub fn new(store: Arc<dyn NoteStore>, authenticator: UpdateAuthenticator) -> AppState {
        AppState {
            store,
            authenticator,
            clock: Arc::new(SystemClock),
            slugs: Arc::new(RandomSlugs::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn TokenClock>) -> AppState {
        self.clock = clock;
        self
    }

    pub fn with_slugs(mut self, slugs: Arc<dyn SlugAllocator>) -> AppState {
        self.slugs = slugs;
        self
    }
}
