//! # mcmeta
//!
//! A memcached client speaking the meta protocol (`mg`, `ms`, `md`, `ma`, `mn`):
//! - Binary-safe values framed by explicit byte lengths
//! - Typed results carrying exactly the metadata a caller asked for
//! - Blocking and async clients sharing one protocol core
//! - Reconnect-on-error with single retry for read-only requests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │               Client (blocking) / AsyncClient                │
//! │                 (serialized per connection)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Operations                              │
//! │         (flag building, validation, reply mapping)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │  Network    │
//!   │   (codec)   │◄─────────│ (connection)│
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  memcached  │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use mcmeta::{Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::for_addr("127.0.0.1:11211"));
//! client.set("greeting", "hello", Some(60))?;
//! assert_eq!(client.get("greeting")?.as_deref(), Some(&b"hello"[..]));
//! # Ok::<(), mcmeta::MetaError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod ops;
pub mod network;
pub mod client;
pub mod result;
pub mod serialize;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MetaError, Result};
pub use config::ClientConfig;
pub use client::{AsyncClient, Client};
pub use ops::{
    ArithmeticMode, ArithmeticOptions, DeleteOptions, GetOptions, StoreMode, StoreOptions,
};
pub use result::{CasToken, GetResult, Ttl};
pub use serialize::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mcmeta
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
