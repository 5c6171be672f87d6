//! Modification tokens for optimistic concurrency.
//!
//! A note carries a token that strictly increases on every successful write.
//! Tokens are drawn from a [`TokenClock`] but never trusted to it: the next
//! token is `max(reading, previous + 1)`, so a coarse or backwards-stepping
//! clock can not produce a repeat.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Opaque, ordered, always positive. Travels as a decimal string so that
/// JSON clients with 53-bit numbers keep every digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModificationToken(i64);

impl ModificationToken {
    pub const FIRST: ModificationToken = ModificationToken(1);

    /// Wrap a value read back from storage.
    pub fn from_stored(value: i64) -> ModificationToken {
        ModificationToken(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ModificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

impl FromStr for ModificationToken {
    type Err = InvalidToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidToken);
        }
        match s.parse::<i64>() {
            Ok(value) if value > 0 => Ok(ModificationToken(value)),
            _ => Err(InvalidToken),
        }
    }
}

impl Serialize for ModificationToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModificationToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| de::Error::custom("modification token must be a positive decimal string"))
    }
}

/// Source of raw token readings.
pub trait TokenClock: Send + Sync {
    fn reading(&self) -> i64;
}

/// Microseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TokenClock for SystemClock {
    fn reading(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Token for a freshly created note.
pub fn initial_token(clock: &dyn TokenClock) -> ModificationToken {
    ModificationToken(clock.reading().max(ModificationToken::FIRST.0))
}

/// Token to store when replacing a note currently at `previous`.
pub fn next_token(clock: &dyn TokenClock, previous: ModificationToken) -> ModificationToken {
    ModificationToken(clock.reading().max(previous.0.saturating_add(1)))
}
