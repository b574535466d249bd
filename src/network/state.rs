//! Per-request state machine
//!
//! ```text
//! Idle → Sending → AwaitingStatusLine → AwaitingPayload → Complete
//!                                   ↘         ↓            ↗
//!                                      Failed (terminal)
//! ```
//!
//! `Failed` forces the connection to be torn down before the next request.

use std::fmt;

use crate::error::MetaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sending,
    AwaitingStatusLine,
    AwaitingPayload,
    Complete,
    Failed,
}

impl RequestState {
    /// Whether a new request may start on the connection
    pub fn is_reusable(&self) -> bool {
        matches!(self, RequestState::Idle | RequestState::Complete)
    }

    /// Classify a read that timed out or hit end-of-stream in this state
    ///
    /// Inside a declared value block the frame can't be completed, which is
    /// a framing violation; anywhere else it is a transport failure.
    pub(crate) fn interrupted(&self, timed_out: bool, timeout_ms: u64) -> MetaError {
        match (self, timed_out) {
            (RequestState::AwaitingPayload, true) => {
                MetaError::Framing(format!("value block incomplete after {} ms", timeout_ms))
            }
            (RequestState::AwaitingPayload, false) => {
                MetaError::Framing("connection closed inside a value block".to_string())
            }
            (_, true) => MetaError::Timeout(timeout_ms),
            (_, false) => MetaError::Connection(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            )),
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Idle => "idle",
            RequestState::Sending => "sending",
            RequestState::AwaitingStatusLine => "awaiting-status-line",
            RequestState::AwaitingPayload => "awaiting-payload",
            RequestState::Complete => "complete",
            RequestState::Failed => "failed",
        };
        f.write_str(name)
    }
}
