//! Protocol Module
//!
//! Defines the memcached meta text protocol as spoken by the client.
//!
//! ## Requests
//! ```text
//! mg <key> <flags>*\r\n
//! ms <key> <datalen> <flags>*\r\n<data>\r\n
//! md <key> <flags>*\r\n
//! ma <key> <flags>*\r\n
//! mn\r\n
//! ```
//!
//! ### Flags
//! Single letter, optionally followed by a token (`T30`, `C1234`, `MA`).
//! Emitted in ascending byte order of the letter.
//!
//! ## Replies
//! ```text
//! VA <datalen> <flags>*\r\n<data>\r\n
//! HD <flags>*\r\n
//! EN\r\n  NF\r\n  NS\r\n  EX\r\n  MN\r\n
//! ```
//!
//! A `VA` value block is read by its declared length, never by scanning for
//! CRLF, so values may hold arbitrary bytes.

mod command;
mod response;
mod codec;

pub use command::{validate_key, Command, Flag, Mode, Verb, MAX_KEY_LEN};
pub use response::{Response, ResponseFlag, ResponseHeader, Status, Ttl};
pub use codec::{
    attach_value, decode_header, decode_response, encode_command, find_line_end, take_line, CRLF,
    MAX_LINE_LEN,
};
