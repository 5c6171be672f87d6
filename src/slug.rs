//! Public note identifiers.

use nanoid::nanoid;

use crate::errors::CommonError;

pub const SLUG_ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];
pub const GENERATED_SLUG_LENGTH: usize = 8;
pub const MAX_SLUG_LENGTH: usize = 32;

/// A normalized slug: lowercase letters, digits, `_` and `-`, at most 32 long.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    /// Trim and lowercase `raw`, then check it.
    pub fn parse(raw: &str) -> Result<Slug, CommonError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(CommonError::Empty);
        }
        if normalized.chars().count() > MAX_SLUG_LENGTH {
            return Err(CommonError::TooLong);
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(CommonError::InvalidFormat);
        }
        Ok(Slug(normalized))
    }

    pub fn generate() -> Slug {
        Slug::generate_with_length(GENERATED_SLUG_LENGTH)
    }

    pub fn generate_with_length(length: usize) -> Slug {
        Slug(nanoid!(length, &SLUG_ALPHABET))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of slugs for notes created without one.
pub trait SlugAllocator: Send + Sync {
    fn allocate(&self) -> Slug;
}

/// Random slugs of a fixed length over [`SLUG_ALPHABET`].
#[derive(Debug, Clone, Copy)]
pub struct RandomSlugs {
    pub length: usize,
}

impl Default for RandomSlugs {
    fn default() -> RandomSlugs {
        RandomSlugs {
            length: GENERATED_SLUG_LENGTH,
        }
    }
}

impl SlugAllocator for RandomSlugs {
    fn allocate(&self) -> Slug {
        Slug::generate_with_length(self.length)
    }
}

/// What the creator asked for. A supplied slug is used verbatim (after
/// normalization) and never swapped for another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugRequest {
    Custom(Slug),
    Allocate,
}

impl SlugRequest {
    /// Blank input counts as no slug at all.
    pub fn from_input(input: Option<&str>) -> Result<SlugRequest, CommonError> {
        match input {
            Some(raw) if !raw.trim().is_empty() => Slug::parse(raw).map(SlugRequest::Custom),
            _ => Ok(SlugRequest::Allocate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_slugs_use_the_alphabet() {
        for _ in 0..200 {
            let slug = Slug::generate();
            assert_eq!(slug.as_str().len(), GENERATED_SLUG_LENGTH);
            assert!(slug.as_str().chars().all(|c| SLUG_ALPHABET.contains(&c)));
            assert_eq!(Slug::parse(slug.as_str()), Ok(slug));
        }
    }

    #[test]
    fn generated_slugs_do_not_repeat() {
        let seen: HashSet<Slug> = (0..1_000).map(|_| Slug::generate()).collect();
        assert_eq!(seen.len(), 1_000);
    }

    #[test]
    fn custom_length() {
        assert_eq!(Slug::generate_with_length(20).as_str().len(), 20);
        assert_eq!(RandomSlugs { length: 12 }.allocate().as_str().len(), 12);
        assert_eq!(
            RandomSlugs::default().allocate().as_str().len(),
            GENERATED_SLUG_LENGTH
        );
    }

    #[test]
    fn parse_normalizes() {
        assert_eq!(Slug::parse("  ABC123 ").unwrap().as_str(), "abc123");
        assert_eq!(Slug::parse("my_note-2").unwrap().as_str(), "my_note-2");
    }

    #[test]
    fn parse_rejects_bad_slugs() {
        assert_eq!(Slug::parse("   "), Err(CommonError::Empty));
        assert_eq!(Slug::parse(&"a".repeat(33)), Err(CommonError::TooLong));
        assert!(Slug::parse(&"a".repeat(32)).is_ok());
        assert_eq!(Slug::parse("has space"), Err(CommonError::InvalidFormat));
        assert_eq!(Slug::parse("../etc"), Err(CommonError::InvalidFormat));
        assert_eq!(Slug::parse("café"), Err(CommonError::InvalidFormat));
    }

    #[test]
    fn request_from_input() {
        assert_eq!(SlugRequest::from_input(None), Ok(SlugRequest::Allocate));
        assert_eq!(SlugRequest::from_input(Some("  ")), Ok(SlugRequest::Allocate));
        assert_eq!(
            SlugRequest::from_input(Some("Abc123")),
            Ok(SlugRequest::Custom(Slug("abc123".to_string())))
        );
        assert_eq!(
            SlugRequest::from_input(Some("no/slash")),
            Err(CommonError::InvalidFormat)
        );
    }
}
