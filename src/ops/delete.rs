//! Delete and invalidate

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::{MetaError, Result};
use crate::protocol::{validate_key, Command, Flag, Response, Status, Verb};
use super::{unexpected, DeleteOptions, Operation};

/// `md`, optionally guarded by a CAS token or downgraded to invalidation
#[derive(Debug, Clone)]
pub struct Delete {
    pub key: Bytes,
    pub options: DeleteOptions,
}

impl Delete {
    pub fn new(key: impl Into<Bytes>, options: DeleteOptions) -> Self {
        Self {
            key: key.into(),
            options,
        }
    }
}

impl Operation for Delete {
    type Output = ();

    fn command(&self, _config: &ClientConfig) -> Result<Command> {
        validate_key(&self.key)?;
        let opts = &self.options;

        if opts.stale_ttl.is_some() && !opts.invalidate {
            return Err(MetaError::Configuration(
                "a stale TTL requires invalidate mode".to_string(),
            ));
        }

        let mut command = Command::new(Verb::Delete, self.key.clone());
        if let Some(token) = opts.cas {
            command.push_flag(Flag::CompareCas(token.value()));
        }
        if opts.invalidate {
            command.push_flag(Flag::Invalidate);
        }
        if let Some(ttl) = opts.stale_ttl {
            command.push_flag(Flag::Ttl(ttl));
        }

        Ok(command)
    }

    fn map(&self, response: Response) -> Result<Self::Output> {
        match response.status {
            Status::Header => Ok(()),
            Status::NotFound => Err(MetaError::NotFound),
            Status::Exists => Err(MetaError::CasConflict),
            _ => Err(unexpected(&response, "md")),
        }
    }
}
