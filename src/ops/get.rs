//! Get, get-and-touch and touch

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::{MetaError, Result};
use crate::protocol::{validate_key, Command, Flag, Response, ResponseFlag, Status, Verb};
use crate::result::{CasToken, GetResult};
use super::{unexpected, GetOptions, Operation};

/// `mg` returning the value plus whatever metadata was requested
///
/// A miss is `Ok(None)`, not an error.
#[derive(Debug, Clone)]
pub struct Get {
    pub key: Bytes,
    pub options: GetOptions,
}

impl Get {
    pub fn new(key: impl Into<Bytes>, options: GetOptions) -> Self {
        Self {
            key: key.into(),
            options,
        }
    }
}

impl Operation for Get {
    type Output = Option<GetResult>;

    fn command(&self, _config: &ClientConfig) -> Result<Command> {
        validate_key(&self.key)?;
        let opts = &self.options;

        let mut command = Command::new(Verb::Get, self.key.clone())
            .with_flag(Flag::ReturnValue)
            .with_flag(Flag::ReturnClientFlags);

        let requested = [
            (opts.return_cas, Flag::ReturnCas),
            (opts.return_ttl, Flag::ReturnTtl),
            (opts.return_hit_before, Flag::ReturnHitBefore),
            (opts.return_last_access, Flag::ReturnLastAccess),
            (opts.return_size, Flag::ReturnSize),
            (opts.return_key, Flag::ReturnKey),
            (opts.no_lru_bump, Flag::NoLruBump),
        ];
        for (wanted, flag) in requested {
            if wanted {
                command.push_flag(flag);
            }
        }

        if let Some(ttl) = opts.touch_ttl {
            command.push_flag(Flag::Ttl(ttl));
        }
        if let Some(ttl) = opts.vivify_on_miss {
            command.push_flag(Flag::Vivify(ttl));
        }
        if let Some(ttl) = opts.recache_threshold {
            command.push_flag(Flag::Recache(ttl));
        }

        Ok(command)
    }

    fn map(&self, response: Response) -> Result<Self::Output> {
        match response.status {
            Status::Miss => Ok(None),
            Status::Value | Status::Header => Ok(Some(build_result(response, &self.options))),
            _ => Err(unexpected(&response, "mg")),
        }
    }
}

/// Copy only the requested metadata into the result
fn build_result(response: Response, opts: &GetOptions) -> GetResult {
    let mut result = GetResult::from_value(response.payload.clone().unwrap_or_default());
    result.client_flags = response.client_flags().unwrap_or(0);

    if opts.return_cas {
        result.cas = response.cas().map(CasToken::new);
    }
    if opts.return_ttl {
        result.ttl = response.ttl();
    }
    if opts.return_hit_before {
        result.hit_before = response.hit_before();
    }
    if opts.return_last_access {
        result.last_access = response.last_access();
    }
    if opts.return_size {
        result.size = response.size();
    }
    if opts.return_key {
        result.key = response.key().cloned();
        result.key_is_base64 = response.has_flag(&ResponseFlag::Base64Key);
    }

    result.won = response.has_flag(&ResponseFlag::Won);
    result.stale = response.has_flag(&ResponseFlag::Stale);
    result.already_won = response.has_flag(&ResponseFlag::AlreadyWon);

    result
}

/// `mg` with `T<ttl>` and no value: bump the TTL, report whether the key exists
#[derive(Debug, Clone)]
pub struct Touch {
    pub key: Bytes,
    pub ttl: u32,
}

impl Touch {
    pub fn new(key: impl Into<Bytes>, ttl: u32) -> Self {
        Self {
            key: key.into(),
            ttl,
        }
    }
}

impl Operation for Touch {
    type Output = bool;

    fn command(&self, _config: &ClientConfig) -> Result<Command> {
        validate_key(&self.key)?;
        Ok(Command::new(Verb::Get, self.key.clone()).with_flag(Flag::Ttl(self.ttl)))
    }

    fn map(&self, response: Response) -> Result<Self::Output> {
        match response.status {
            Status::Header | Status::Value => Ok(true),
            Status::Miss => Ok(false),
            _ => Err(unexpected(&response, "mg")),
        }
    }
}

/// `mg` with `c`: the value plus the token a later cas write needs
#[derive(Debug, Clone)]
pub struct Gets {
    inner: Get,
}

impl Gets {
    pub fn new(key: impl Into<Bytes>) -> Self {
        Self {
            inner: Get::new(key, GetOptions::new().cas()),
        }
    }
}

impl Operation for Gets {
    type Output = Option<(Bytes, CasToken)>;

    fn command(&self, config: &ClientConfig) -> Result<Command> {
        self.inner.command(config)
    }

    fn map(&self, response: Response) -> Result<Self::Output> {
        match self.inner.map(response)? {
            None => Ok(None),
            Some(hit) => match hit.cas {
                Some(token) => Ok(Some((hit.value, token))),
                None => Err(MetaError::Protocol("mg hit without a CAS token".to_string())),
            },
        }
    }
}
