//! Network Module
//!
//! Connection management for a single server.
//!
//! ## Architecture
//! - One connection per client, opened lazily on first use
//! - Strict request/reply: one exchange in flight per connection
//! - Any transport, framing or protocol failure tears the connection down;
//!   the next request reconnects
//!
//! The blocking and async connections share the codec and the request state
//! machine and differ only in how they wait for the socket.

mod state;
mod connection;
mod async_connection;

pub use state::RequestState;
pub use connection::Connection;
pub use async_connection::AsyncConnection;
