//! Blocking Client
//!
//! Occupies the calling thread until the reply is parsed. Safe to share
//! across threads; concurrent callers queue on the connection lock.

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::network::Connection;
use crate::ops::{
    Arithmetic, ArithmeticOptions, Delete, DeleteOptions, FlushAll, Get, GetOptions, Gets, Noop,
    Operation, Store, StoreMode, StoreOptions, Touch,
};
use crate::protocol::{Command, Response};
use crate::result::{CasToken, GetResult};
use crate::serialize::Value;
use super::{key_bytes, load_value, store_options};

/// Blocking meta-protocol client over a single connection
pub struct Client {
    config: ClientConfig,

    /// The one connection, `None` until first use or after a failure
    conn: Mutex<Option<Connection>>,
}

impl Client {
    /// Create a client; the connection is opened on first use
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a connection is currently held open
    pub fn is_connected(&self) -> bool {
        self.conn.lock().is_some()
    }

    /// Close the connection; the next request reconnects
    pub fn close(&self) {
        if let Some(conn) = self.conn.lock().take() {
            conn.close();
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Value for `key`, or `None` on a miss
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        Ok(self.get_with(key, GetOptions::new())?.map(|hit| hit.value))
    }

    /// Value plus the metadata requested in `options`
    pub fn get_with(&self, key: impl AsRef<[u8]>, options: GetOptions) -> Result<Option<GetResult>> {
        self.run(&Get::new(key_bytes(key), options))
    }

    /// Value and CAS token
    pub fn gets(&self, key: impl AsRef<[u8]>) -> Result<Option<(Bytes, CasToken)>> {
        self.run(&Gets::new(key_bytes(key)))
    }

    /// Read the value and set a new TTL in one request
    pub fn get_and_touch(&self, key: impl AsRef<[u8]>, ttl: u32) -> Result<Option<GetResult>> {
        self.get_with(key, GetOptions::new().touch(ttl).ttl())
    }

    /// Set a new TTL; `false` if the key is absent
    pub fn touch(&self, key: impl AsRef<[u8]>, ttl: u32) -> Result<bool> {
        self.run(&Touch::new(key_bytes(key), ttl))
    }

    /// Hits for `keys` in request order; misses are left out
    pub fn get_many<I, K>(&self, keys: I) -> Result<Vec<(Bytes, GetResult)>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut hits = Vec::new();
        for key in keys {
            let key = key_bytes(key);
            if let Some(hit) = self.run(&Get::new(key.clone(), GetOptions::new()))? {
                hits.push((key, hit));
            }
        }
        Ok(hits)
    }

    /// Typed value, decoded according to its stored client flags
    pub fn get_value(&self, key: impl AsRef<[u8]>) -> Result<Option<Value>> {
        load_value(self.get_with(key, GetOptions::new())?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store unconditionally; `ttl` falls back to the configured default
    pub fn set(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>, ttl: Option<u32>) -> Result<()> {
        self.store(key, value, store_options(StoreMode::Set, ttl)).map(drop)
    }

    /// Store a typed value with its client flags
    pub fn set_value(&self, key: impl AsRef<[u8]>, value: &Value, ttl: Option<u32>) -> Result<()> {
        let (data, flags) = value.dump();
        let options = store_options(StoreMode::Set, ttl).client_flags(flags);
        self.store(key, data, options).map(drop)
    }

    /// Store only if the key is absent
    pub fn add(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>, ttl: Option<u32>) -> Result<()> {
        self.store(key, value, store_options(StoreMode::Add, ttl)).map(drop)
    }

    /// Store only if the key exists
    pub fn replace(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>, ttl: Option<u32>) -> Result<()> {
        self.store(key, value, store_options(StoreMode::Replace, ttl)).map(drop)
    }

    /// Append to an existing value, creating it with `vivify_ttl` if given
    pub fn append(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>, vivify_ttl: Option<u32>) -> Result<()> {
        let options = StoreOptions::new(StoreMode::Append).vivify_ttl(vivify_ttl);
        self.store(key, value, options).map(drop)
    }

    /// Prepend to an existing value, creating it with `vivify_ttl` if given
    pub fn prepend(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>, vivify_ttl: Option<u32>) -> Result<()> {
        let options = StoreOptions::new(StoreMode::Prepend).vivify_ttl(vivify_ttl);
        self.store(key, value, options).map(drop)
    }

    /// Store only if the item still carries `token`
    pub fn cas(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        token: CasToken,
        ttl: Option<u32>,
    ) -> Result<()> {
        let options = store_options(StoreMode::Set, ttl).cas(token);
        self.store(key, value, options).map(drop)
    }

    /// Store with full control over the `ms` flags
    pub fn store(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        options: StoreOptions,
    ) -> Result<Option<CasToken>> {
        self.run(&Store::new(key_bytes(key), value, options))
    }

    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.delete_with(key, DeleteOptions::new())
    }

    pub fn delete_with(&self, key: impl AsRef<[u8]>, options: DeleteOptions) -> Result<()> {
        self.run(&Delete::new(key_bytes(key), options))
    }

    /// Mark the item stale instead of removing it
    pub fn invalidate(&self, key: impl AsRef<[u8]>, stale_ttl: Option<u32>) -> Result<()> {
        self.delete_with(key, DeleteOptions::new().invalidate(stale_ttl))
    }

    pub fn incr(&self, key: impl AsRef<[u8]>, delta: u64) -> Result<u64> {
        self.arithmetic(key, ArithmeticOptions::incr(delta))
    }

    /// Decrement; the server floors the result at zero
    pub fn decr(&self, key: impl AsRef<[u8]>, delta: u64) -> Result<u64> {
        self.arithmetic(key, ArithmeticOptions::decr(delta))
    }

    pub fn arithmetic(&self, key: impl AsRef<[u8]>, options: ArithmeticOptions) -> Result<u64> {
        self.run(&Arithmetic::new(key_bytes(key), options))
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Invalidate every item, optionally after `delay` seconds
    pub fn flush_all(&self, delay: Option<u32>) -> Result<()> {
        self.run(&FlushAll { delay })
    }

    pub fn noop(&self) -> Result<()> {
        self.run(&Noop)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Build, send and map one operation
    pub fn run<O: Operation>(&self, op: &O) -> Result<O::Output> {
        let command = op.command(&self.config)?;
        command.validate()?;

        let mut slot = self.conn.lock();
        let response = self.execute_locked(&mut slot, &command)?;

        let output = op.map(response);
        if let Err(e) = &output {
            if e.invalidates_connection() {
                if let Some(conn) = slot.take() {
                    tracing::debug!("Discarding connection to {}: {}", conn.peer_addr(), e);
                    conn.close();
                }
            }
        }
        output
    }

    /// Send a raw command and return the undecoded reply
    ///
    /// The command is validated before the lock is taken; an illegal key
    /// or a mode that doesn't match the verb never reaches the socket.
    pub fn execute(&self, command: &Command) -> Result<Response> {
        command.validate()?;

        let mut slot = self.conn.lock();
        self.execute_locked(&mut slot, command)
    }

    fn execute_locked(&self, slot: &mut Option<Connection>, command: &Command) -> Result<Response> {
        match self.attempt(slot, command) {
            Err(e) if e.is_retryable() && command.is_read_only() => {
                tracing::warn!("Retrying {:?} on a fresh connection after: {}", command.verb(), e);
                self.attempt(slot, command)
            }
            other => other,
        }
    }

    fn attempt(&self, slot: &mut Option<Connection>, command: &Command) -> Result<Response> {
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => Connection::connect(&self.config)?,
        };

        match conn.execute(command, self.config.request_timeout()) {
            Ok(response) => {
                *slot = Some(conn);
                Ok(response)
            }
            Err(e) => {
                tracing::debug!("Discarding connection to {}: {}", conn.peer_addr(), e);
                conn.close();
                Err(e)
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            conn.close();
        }
    }
}
