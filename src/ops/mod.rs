//! Operations Module
//!
//! Translates high-level cache operations into meta commands and maps the
//! replies back to typed results or errors.
//!
//! ## Operation Table
//! | Operation        | Verb        | Notable flags                    |
//! |------------------|-------------|----------------------------------|
//! | get              | `mg`        | `v f` + `c t h l s k` on request |
//! | gets             | `mg`        | `v f c`                          |
//! | get-and-touch    | `mg`        | `T<ttl>`                         |
//! | touch            | `mg`        | `T<ttl>` without `v`             |
//! | set/add/replace  | `ms`        | `T` `F` `ME` / `MR`              |
//! | append/prepend   | `ms`        | `MA` / `MP`, `N<ttl>`            |
//! | cas              | `ms`        | `C<token>`                       |
//! | delete           | `md`        | `C<token>`, `I` `T`              |
//! | incr/decr        | `ma`        | `MI`/`MD` `D` `J` `N` `v`        |
//! | flush-all        | `flush_all` | delay                            |
//! | noop             | `mn`        |                                  |
//!
//! Building a command validates every flag combination first, so a bad
//! combination fails before any bytes are sent.

mod options;
mod get;
mod store;
mod delete;
mod arithmetic;
mod admin;

pub use options::{
    ArithmeticMode, ArithmeticOptions, DeleteOptions, GetOptions, StoreMode, StoreOptions,
};
pub use get::{Get, Gets, Touch};
pub use store::Store;
pub use delete::Delete;
pub use arithmetic::Arithmetic;
pub use admin::{FlushAll, Noop};

use crate::config::ClientConfig;
use crate::error::{MetaError, Result};
use crate::protocol::{Command, Response, Status};

/// A single request/reply exchange with a typed outcome
///
/// Both client adapters drive operations through this trait, so the same
/// command bytes and the same reply mapping apply whichever one is used.
pub trait Operation {
    type Output;

    /// Validate the inputs and build the wire command
    fn command(&self, config: &ClientConfig) -> Result<Command>;

    /// Map the decoded reply to the operation's result
    fn map(&self, response: Response) -> Result<Self::Output>;
}

/// Error for a reply status the operation doesn't expect
pub(crate) fn unexpected(response: &Response, op: &str) -> MetaError {
    match &response.status {
        Status::Error => MetaError::Server("ERROR".to_string()),
        Status::ClientError(msg) => MetaError::Server(format!("CLIENT_ERROR {}", msg)),
        Status::ServerError(msg) => MetaError::Server(format!("SERVER_ERROR {}", msg)),
        other => MetaError::Protocol(format!(
            "unexpected {} reply to {}",
            other.token(),
            op
        )),
    }
}
