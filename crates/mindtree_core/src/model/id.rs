//! Topic identifiers and identifier allocation.
//!
//! # Responsibility
//! - Define the opaque `TopicId` carried by every live topic.
//! - Define `TopicKey`, the addressing variant that separates reserved
//!   positions (root, central, cursor) from ordinary identifiers.
//! - Generate collision-resistant, fixed-length identifiers.
//!
//! # Invariants
//! - Generated identifiers are always `ORDINARY_ID_LEN` characters long.
//! - Two identifiers produced by the same process never compare equal, even
//!   when the random source repeats, because a shared counter is mixed in.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Encoded length of every ordinary identifier.
pub const ORDINARY_ID_LEN: usize = 26;

const RANDOM_BYTES_LEN: usize = 16;
const COUNTER_SPAN: std::ops::Range<usize> = 5..9;
const ID_ALPHABET: &[u8; 32] = b"123456789abcdefghijklmnopqrstuvw";

static OBJECT_ID_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Opaque identifier of one topic.
///
/// Round-trips as a plain string. Uniqueness holds only inside one loaded
/// or created sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    /// Wraps an existing identifier string without validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this identifier has the generated, fixed-length shape.
    pub fn is_ordinary(&self) -> bool {
        self.0.len() == ORDINARY_ID_LEN
    }
}

impl Display for TopicId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TopicId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Address of a position inside one sheet.
///
/// The three reserved variants never collide with a real topic identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicKey {
    /// The sheet wrapper itself. Nothing can be inserted here.
    Root,
    /// The sheet's central topic.
    Central,
    /// The last topic addressed through navigation.
    Cursor,
    /// A real topic.
    Ordinary(TopicId),
}

impl TopicKey {
    /// Returns the wrapped identifier for `Ordinary`, `None` for reserved keys.
    pub fn ordinary(&self) -> Option<&TopicId> {
        match self {
            Self::Ordinary(id) => Some(id),
            _ => None,
        }
    }
}

impl From<TopicId> for TopicKey {
    fn from(value: TopicId) -> Self {
        Self::Ordinary(value)
    }
}

impl From<&TopicId> for TopicKey {
    fn from(value: &TopicId) -> Self {
        Self::Ordinary(value.clone())
    }
}

/// Source of fresh topic identifiers.
///
/// Sheets hold one allocator each; tests inject [`SequentialIdAllocator`] to
/// get reproducible identifiers.
pub trait IdAllocator: Debug + Send + Sync {
    /// Produces one identifier distinct from every previous one.
    fn next_id(&self) -> TopicId;
}

/// Default allocator: random bytes stamped with a process-wide counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdAllocator;

impl IdAllocator for RandomIdAllocator {
    fn next_id(&self) -> TopicId {
        let mut bytes = *uuid::Uuid::new_v4().as_bytes();
        let count = OBJECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        stamp_counter(&mut bytes, count);
        TopicId(encode_id(&bytes))
    }
}

/// Overwrites the counter span with the non-zero bytes of `count`.
///
/// Zero bytes keep the random value underneath.
fn stamp_counter(bytes: &mut [u8; RANDOM_BYTES_LEN], count: u32) {
    for (slot, byte) in bytes[COUNTER_SPAN].iter_mut().zip(count.to_be_bytes()) {
        if byte > 0 {
            *slot = byte;
        }
    }
}

/// Deterministic allocator producing ordinary identifiers from a counter.
#[derive(Debug, Default)]
pub struct SequentialIdAllocator {
    seed: u64,
    next: AtomicU64,
}

impl SequentialIdAllocator {
    /// Creates an allocator whose identifiers all share `seed` as prefix.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            next: AtomicU64::new(0),
        }
    }
}

impl IdAllocator for SequentialIdAllocator {
    fn next_id(&self) -> TopicId {
        let count = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let mut bytes = [0_u8; RANDOM_BYTES_LEN];
        bytes[..8].copy_from_slice(&self.seed.to_be_bytes());
        bytes[8..].copy_from_slice(&count.to_be_bytes());
        TopicId(encode_id(&bytes))
    }
}

/// Returns a fresh identifier from the default allocator.
pub fn generate_id() -> TopicId {
    RandomIdAllocator.next_id()
}

fn encode_id(bytes: &[u8; RANDOM_BYTES_LEN]) -> String {
    let mut encoded = String::with_capacity(ORDINARY_ID_LEN);
    let mut buffer: u32 = 0;
    let mut pending_bits = 0_u32;
    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        pending_bits += 8;
        while pending_bits >= 5 {
            pending_bits -= 5;
            encoded.push(ID_ALPHABET[((buffer >> pending_bits) & 0x1f) as usize] as char);
        }
    }
    if pending_bits > 0 {
        encoded.push(ID_ALPHABET[((buffer << (5 - pending_bits)) & 0x1f) as usize] as char);
    }
    encoded
}
