//! Client Module
//!
//! The two execution adapters over one shared core.
//!
//! ```text
//!   Client (blocking)              AsyncClient (tokio)
//!        │                               │
//!        └───────────┬───────────────────┘
//!                    ▼
//!          ops::Operation  ── command() / map()
//!                    │
//!                    ▼
//!        Mutex<Option<connection>>  ── one request at a time
//!                    │
//!                    ▼
//!        protocol codec + state machine
//! ```
//!
//! Both adapters build commands and map replies through the same
//! [`Operation`](crate::ops::Operation) impls; only the waiting differs.
//!
//! ## Connection Policy
//! - The connection is taken out of its slot for the length of a request
//!   and put back only after a complete, well-framed reply
//! - A failed, timed-out or cancelled request therefore drops the connection
//! - Read-only requests are replayed once on a fresh connection after a
//!   connection-class error; mutations never are

mod blocking;
mod async_client;

pub use blocking::Client;
pub use async_client::AsyncClient;

use bytes::Bytes;

use crate::error::Result;
use crate::ops::{StoreMode, StoreOptions};
use crate::result::GetResult;
use crate::serialize::Value;

/// Copy a caller's key into an owned buffer
pub(crate) fn key_bytes(key: impl AsRef<[u8]>) -> Bytes {
    Bytes::copy_from_slice(key.as_ref())
}

/// Options for a store in `mode` with an optional TTL
pub(crate) fn store_options(mode: StoreMode, ttl: Option<u32>) -> StoreOptions {
    StoreOptions::new(mode).ttl(ttl)
}

/// Rebuild a typed value from a hit
pub(crate) fn load_value(hit: Option<GetResult>) -> Result<Option<Value>> {
    hit.map(|hit| Value::load(hit.value, hit.client_flags)).transpose()
}
