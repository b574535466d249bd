//! Keyless commands

use crate::config::ClientConfig;
use crate::error::Result;
use crate::protocol::{Command, Response, Status};
use super::{unexpected, Operation};

/// `flush_all [delay]`
#[derive(Debug, Clone, Default)]
pub struct FlushAll {
    /// Seconds before the flush takes effect
    pub delay: Option<u32>,
}

impl Operation for FlushAll {
    type Output = ();

    fn command(&self, _config: &ClientConfig) -> Result<Command> {
        Ok(Command::flush_all(self.delay.filter(|d| *d > 0)))
    }

    fn map(&self, response: Response) -> Result<Self::Output> {
        match response.status {
            Status::Ok => Ok(()),
            _ => Err(unexpected(&response, "flush_all")),
        }
    }
}

/// `mn`, used as a liveness check
#[derive(Debug, Clone, Default)]
pub struct Noop;

impl Operation for Noop {
    type Output = ();

    fn command(&self, _config: &ClientConfig) -> Result<Command> {
        Ok(Command::noop())
    }

    fn map(&self, response: Response) -> Result<Self::Output> {
        match response.status {
            Status::Noop => Ok(()),
            _ => Err(unexpected(&response, "mn")),
        }
    }
}
