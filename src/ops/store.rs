//! Set, add, replace, append, prepend and cas

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::{MetaError, Result};
use crate::protocol::{validate_key, Command, Flag, Mode, Response, Status, Verb};
use crate::result::CasToken;
use super::{unexpected, Operation, StoreMode, StoreOptions};

/// `ms` in any of its modes
///
/// Yields the new CAS token when `return_cas` was requested.
#[derive(Debug, Clone)]
pub struct Store {
    pub key: Bytes,
    pub value: Bytes,
    pub options: StoreOptions,
}

impl Store {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>, options: StoreOptions) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            options,
        }
    }

    fn validate(&self, config: &ClientConfig) -> Result<()> {
        validate_key(&self.key)?;
        let opts = &self.options;

        if self.value.len() > config.max_value_size {
            return Err(MetaError::Configuration(format!(
                "value too large: {} bytes (max {})",
                self.value.len(),
                config.max_value_size
            )));
        }

        let concatenating = matches!(opts.mode, StoreMode::Append | StoreMode::Prepend);
        if opts.cas.is_some() && opts.mode == StoreMode::Add {
            return Err(MetaError::Configuration(
                "a CAS token cannot be combined with add mode".to_string(),
            ));
        }
        if opts.vivify_ttl.is_some() && !concatenating {
            return Err(MetaError::Configuration(
                "vivify TTL only applies to append and prepend".to_string(),
            ));
        }
        if opts.ttl.is_some() && concatenating {
            return Err(MetaError::Configuration(
                "append and prepend keep the item's TTL; use a vivify TTL instead".to_string(),
            ));
        }

        Ok(())
    }
}

impl Operation for Store {
    type Output = Option<CasToken>;

    fn command(&self, config: &ClientConfig) -> Result<Command> {
        self.validate(config)?;
        let opts = &self.options;

        let mut command = Command::new(Verb::Set, self.key.clone())
            .with_flag(Flag::ClientFlags(opts.client_flags))
            .with_payload(self.value.clone());

        let mode = match opts.mode {
            StoreMode::Set => None,
            StoreMode::Add => Some(Mode::Add),
            StoreMode::Replace => Some(Mode::Replace),
            StoreMode::Append => Some(Mode::Append),
            StoreMode::Prepend => Some(Mode::Prepend),
        };
        if let Some(mode) = mode {
            command.push_flag(Flag::Mode(mode));
        }

        let ttl = match opts.mode {
            StoreMode::Append | StoreMode::Prepend => None,
            _ => opts.ttl.or(Some(config.default_ttl).filter(|t| *t > 0)),
        };
        if let Some(ttl) = ttl {
            command.push_flag(Flag::Ttl(ttl));
        }
        if let Some(token) = opts.cas {
            command.push_flag(Flag::CompareCas(token.value()));
        }
        if let Some(ttl) = opts.vivify_ttl {
            command.push_flag(Flag::Vivify(ttl));
        }
        if opts.return_cas {
            command.push_flag(Flag::ReturnCas);
        }

        Ok(command)
    }

    fn map(&self, response: Response) -> Result<Self::Output> {
        match response.status {
            Status::Header => Ok(response.cas().map(CasToken::new).filter(|_| self.options.return_cas)),
            Status::NotStored => Err(MetaError::PreconditionFailed),
            Status::Exists => Err(MetaError::CasConflict),
            Status::NotFound => Err(MetaError::NotFound),
            _ => Err(unexpected(&response, "ms")),
        }
    }
}
