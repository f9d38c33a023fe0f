//! Core type aliases, traits, and constants for the chicken game engine.
//!
//! This crate provides the foundational identifiers and configuration
//! parameters shared by every other crate in the workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Points awarded to one player for one round.
pub type Score = i32;
/// Monotonic per-session change counter observed by pollers.
pub type Version = i64;
/// Session-scoped event sequence number.
pub type Seq = i64;
/// One-based round index within a session.
pub type RoundNumber = i16;

// ============================================================================
// TRAITS
// ============================================================================
/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// GAME PARAMETERS
// ============================================================================
/// Rounds per session. The 11th round start is refused.
pub const MAX_ROUNDS: RoundNumber = 10;
/// Fewest non-facilitator players a session can activate with.
pub const MIN_PLAYERS: usize = 2;
/// Rounds during which paired players may exchange a message.
pub const MESSAGE_ROUNDS: std::ops::RangeInclusive<RoundNumber> = 5..=6;
/// Rounds played after indicators are handed out.
pub const INDICATOR_ROUNDS: std::ops::RangeInclusive<RoundNumber> = 7..=MAX_ROUNDS;
/// Indicators may be assigned once the session has reached this round.
pub const INDICATOR_FROM: RoundNumber = 6;
/// Longest accepted message, in characters.
pub const MESSAGE_LIMIT: usize = 100;

// ============================================================================
// SESSION PARAMETERS
// ============================================================================
/// Letters in a human-enterable join code.
pub const CODE_LENGTH: usize = 6;
/// Fresh codes drawn before session creation gives up on collisions.
pub const CODE_ATTEMPTS: usize = 16;
/// Display name given to the facilitator participant.
pub const FACILITATOR_NAME: &str = "Host";
/// Longest accepted display name, in characters.
pub const NAME_LIMIT: usize = 50;
/// Default page size when tailing the event log.
pub const EVENTS_LIMIT: i64 = 100;
/// Hard cap on one event log page.
pub const EVENTS_LIMIT_MAX: i64 = 1000;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate termination.
/// In-flight units of work roll back with their connections.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            log::warn!("interrupt received, exiting immediately");
            std::process::exit(0);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    struct Marker;
    #[test]
    fn ids_are_unique() {
        let a = ID::<Marker>::default();
        let b = ID::<Marker>::default();
        assert_ne!(a, b);
        assert_eq!(a, a.cast::<Marker>());
    }
    #[test]
    fn id_roundtrips_through_json() {
        let id = ID::<Marker>::default();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: ID<Marker> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
    #[test]
    fn phases_partition_rounds() {
        assert!(!MESSAGE_ROUNDS.contains(&4));
        assert!(MESSAGE_ROUNDS.contains(&5));
        assert!(INDICATOR_ROUNDS.contains(&7));
        assert!(INDICATOR_ROUNDS.contains(&MAX_ROUNDS));
    }
}
