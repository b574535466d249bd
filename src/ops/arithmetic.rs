//! Increment and decrement

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::{MetaError, Result};
use crate::protocol::{validate_key, Command, Flag, Mode, Response, Status, Verb};
use super::{unexpected, ArithmeticMode, ArithmeticOptions, Operation};

/// `ma` returning the counter's new value
///
/// Decrementing below zero yields zero; that floor is the server's and the
/// value is passed through unchanged.
#[derive(Debug, Clone)]
pub struct Arithmetic {
    pub key: Bytes,
    pub options: ArithmeticOptions,
}

impl Arithmetic {
    pub fn new(key: impl Into<Bytes>, options: ArithmeticOptions) -> Self {
        Self {
            key: key.into(),
            options,
        }
    }
}

impl Operation for Arithmetic {
    type Output = u64;

    fn command(&self, _config: &ClientConfig) -> Result<Command> {
        validate_key(&self.key)?;
        let opts = &self.options;

        let mode = match opts.mode {
            ArithmeticMode::Increment => Mode::Increment,
            ArithmeticMode::Decrement => Mode::Decrement,
        };

        let mut command = Command::new(Verb::Arithmetic, self.key.clone())
            .with_flag(Flag::Mode(mode))
            .with_flag(Flag::Delta(opts.delta))
            .with_flag(Flag::ReturnValue);

        match (opts.initial, opts.initial_ttl) {
            (Some(initial), Some(ttl)) => {
                command.push_flag(Flag::Initial(initial));
                command.push_flag(Flag::Vivify(ttl));
            }
            (None, None) => {}
            _ => {
                return Err(MetaError::Configuration(
                    "auto-vivify needs both an initial value and an initial TTL".to_string(),
                ))
            }
        }

        if let Some(ttl) = opts.update_ttl {
            command.push_flag(Flag::Ttl(ttl));
        }

        Ok(command)
    }

    fn map(&self, response: Response) -> Result<Self::Output> {
        match response.status {
            Status::Value => {
                let payload = response.payload.unwrap_or_default();
                std::str::from_utf8(&payload)
                    .ok()
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .ok_or_else(|| {
                        MetaError::Protocol(format!(
                            "counter value is not a decimal number: {:?}",
                            String::from_utf8_lossy(&payload)
                        ))
                    })
            }
            Status::NotFound => Err(MetaError::NotFound),
            Status::NotStored => Err(MetaError::PreconditionFailed),
            Status::Exists => Err(MetaError::CasConflict),
            _ => Err(unexpected(&response, "ma")),
        }
    }
}
