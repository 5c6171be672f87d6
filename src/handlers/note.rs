use actix_web::web;

use crate::errors::{CommonError, Fields, ServerError};
use crate::slug::Slug;

pub mod mutate;
pub mod post;
pub mod query;

pub const MAX_UPDATE_SECRET_LENGTH: usize = 1024;

/// Run store or hashing work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, ServerError> + Send + 'static,
    T: Send + 'static,
{
    web::block(work).await?
}

/// A slug from the URL. Anything that could never have been stored is
/// simply not found.
fn path_slug(raw: &str) -> Result<Slug, ServerError> {
    Slug::parse(raw).map_err(|_| ServerError::NotFound(raw.to_owned()))
}

fn check_update_secret(update_secret: &str) -> Option<Fields> {
    if update_secret.is_empty() {
        Some(Fields::UpdateSecret(CommonError::Empty))
    } else if update_secret.len() > MAX_UPDATE_SECRET_LENGTH {
        Some(Fields::UpdateSecret(CommonError::TooLong))
    } else {
        None
    }
}
