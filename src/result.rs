//! Result types
//!
//! Value objects handed back to callers. Metadata fields are `Option`s and
//! stay `None` unless the caller asked for them, so "not requested" never
//! reads as zero.

use std::fmt;

use bytes::Bytes;

pub use crate::protocol::Ttl;

/// Opaque version marker issued for a key by a CAS-tracking read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CasToken(u64);

impl CasToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A hit returned by a metadata read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResult {
    /// Item value
    pub value: Bytes,

    /// Client flags stored with the item (always fetched)
    pub client_flags: u32,

    pub cas: Option<CasToken>,
    pub ttl: Option<Ttl>,
    pub hit_before: Option<bool>,
    pub last_access: Option<u64>,
    pub size: Option<u64>,
    pub key: Option<Bytes>,

    /// `key` is base64-encoded (`b` in the reply)
    pub key_is_base64: bool,

    // Stale-while-revalidate markers, always reported by the server
    pub won: bool,
    pub stale: bool,
    pub already_won: bool,
}

impl GetResult {
    /// A result carrying only a value
    pub fn from_value(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
            client_flags: 0,
            cas: None,
            ttl: None,
            hit_before: None,
            last_access: None,
            size: None,
            key: None,
            key_is_base64: false,
            won: false,
            stale: false,
            already_won: false,
        }
    }
}
