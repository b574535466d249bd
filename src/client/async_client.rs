//! Async Client
//!
//! Same surface and results as [`Client`](super::Client), yielding the task
//! while the socket is not ready. Tasks sharing a client queue on an async
//! lock, so one task's bytes never interleave with another's.
//!
//! Dropping a request future before the reply is fully read drops the
//! connection along with it; the next request reconnects.

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::network::AsyncConnection;
use crate::ops::{
    Arithmetic, ArithmeticOptions, Delete, DeleteOptions, FlushAll, Get, GetOptions, Gets, Noop,
    Operation, Store, StoreMode, StoreOptions, Touch,
};
use crate::protocol::{Command, Response};
use crate::result::{CasToken, GetResult};
use crate::serialize::Value;
use super::{key_bytes, load_value, store_options};

/// Async meta-protocol client over a single connection
pub struct AsyncClient {
    config: ClientConfig,
    conn: Mutex<Option<AsyncConnection>>,
}

impl AsyncClient {
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

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Close the connection; the next request reconnects
    pub async fn close(&self) {
        let conn = self.conn.lock().await.take();
        if let Some(conn) = conn {
            conn.close().await;
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        Ok(self.get_with(key, GetOptions::new()).await?.map(|hit| hit.value))
    }

    pub async fn get_with(&self, key: impl AsRef<[u8]>, options: GetOptions) -> Result<Option<GetResult>> {
        self.run(&Get::new(key_bytes(key), options)).await
    }

    pub async fn gets(&self, key: impl AsRef<[u8]>) -> Result<Option<(Bytes, CasToken)>> {
        self.run(&Gets::new(key_bytes(key))).await
    }

    pub async fn get_and_touch(&self, key: impl AsRef<[u8]>, ttl: u32) -> Result<Option<GetResult>> {
        self.get_with(key, GetOptions::new().touch(ttl).ttl()).await
    }

    pub async fn touch(&self, key: impl AsRef<[u8]>, ttl: u32) -> Result<bool> {
        self.run(&Touch::new(key_bytes(key), ttl)).await
    }

    /// Hits for `keys` in request order; misses are left out
    pub async fn get_many<I, K>(&self, keys: I) -> Result<Vec<(Bytes, GetResult)>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let keys: Vec<Bytes> = keys.into_iter().map(key_bytes).collect();
        let mut hits = Vec::new();
        for key in keys {
            if let Some(hit) = self.run(&Get::new(key.clone(), GetOptions::new())).await? {
                hits.push((key, hit));
            }
        }
        Ok(hits)
    }

    pub async fn get_value(&self, key: impl AsRef<[u8]>) -> Result<Option<Value>> {
        load_value(self.get_with(key, GetOptions::new()).await?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn set(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>, ttl: Option<u32>) -> Result<()> {
        self.store(key, value, store_options(StoreMode::Set, ttl)).await.map(drop)
    }

    pub async fn set_value(&self, key: impl AsRef<[u8]>, value: &Value, ttl: Option<u32>) -> Result<()> {
        let (data, flags) = value.dump();
        let options = store_options(StoreMode::Set, ttl).client_flags(flags);
        self.store(key, data, options).await.map(drop)
    }

    pub async fn add(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>, ttl: Option<u32>) -> Result<()> {
        self.store(key, value, store_options(StoreMode::Add, ttl)).await.map(drop)
    }

    pub async fn replace(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>, ttl: Option<u32>) -> Result<()> {
        self.store(key, value, store_options(StoreMode::Replace, ttl)).await.map(drop)
    }

    pub async fn append(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        vivify_ttl: Option<u32>,
    ) -> Result<()> {
        let options = StoreOptions::new(StoreMode::Append).vivify_ttl(vivify_ttl);
        self.store(key, value, options).await.map(drop)
    }

    pub async fn prepend(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        vivify_ttl: Option<u32>,
    ) -> Result<()> {
        let options = StoreOptions::new(StoreMode::Prepend).vivify_ttl(vivify_ttl);
        self.store(key, value, options).await.map(drop)
    }

    pub async fn cas(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        token: CasToken,
        ttl: Option<u32>,
    ) -> Result<()> {
        let options = store_options(StoreMode::Set, ttl).cas(token);
        self.store(key, value, options).await.map(drop)
    }

    pub async fn store(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        options: StoreOptions,
    ) -> Result<Option<CasToken>> {
        let op = Store::new(key_bytes(key), value, options);
        self.run(&op).await
    }

    pub async fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        self.delete_with(key, DeleteOptions::new()).await
    }

    pub async fn delete_with(&self, key: impl AsRef<[u8]>, options: DeleteOptions) -> Result<()> {
        self.run(&Delete::new(key_bytes(key), options)).await
    }

    pub async fn invalidate(&self, key: impl AsRef<[u8]>, stale_ttl: Option<u32>) -> Result<()> {
        self.delete_with(key, DeleteOptions::new().invalidate(stale_ttl)).await
    }

    pub async fn incr(&self, key: impl AsRef<[u8]>, delta: u64) -> Result<u64> {
        self.arithmetic(key, ArithmeticOptions::incr(delta)).await
    }

    pub async fn decr(&self, key: impl AsRef<[u8]>, delta: u64) -> Result<u64> {
        self.arithmetic(key, ArithmeticOptions::decr(delta)).await
    }

    pub async fn arithmetic(&self, key: impl AsRef<[u8]>, options: ArithmeticOptions) -> Result<u64> {
        self.run(&Arithmetic::new(key_bytes(key), options)).await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    pub async fn flush_all(&self, delay: Option<u32>) -> Result<()> {
        self.run(&FlushAll { delay }).await
    }

    pub async fn noop(&self) -> Result<()> {
        self.run(&Noop).await
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Build, send and map one operation
    pub async fn run<O: Operation>(&self, op: &O) -> Result<O::Output> {
        let command = op.command(&self.config)?;
        command.validate()?;

        let mut slot = self.conn.lock().await;
        let response = self.execute_locked(&mut slot, &command).await?;

        let output = op.map(response);
        if let Err(e) = &output {
            if e.invalidates_connection() {
                if let Some(conn) = slot.take() {
                    tracing::debug!("Discarding connection to {}: {}", conn.peer_addr(), e);
                }
            }
        }
        output
    }

    /// Send a raw command and return the undecoded reply
    ///
    /// The command is validated before the lock is taken; an illegal key
    /// or a mode that doesn't match the verb never reaches the socket.
    pub async fn execute(&self, command: &Command) -> Result<Response> {
        command.validate()?;

        let mut slot = self.conn.lock().await;
        self.execute_locked(&mut slot, command).await
    }

    async fn execute_locked(&self, slot: &mut Option<AsyncConnection>, command: &Command) -> Result<Response> {
        match self.attempt(slot, command).await {
            Err(e) if e.is_retryable() && command.is_read_only() => {
                tracing::warn!("Retrying {:?} on a fresh connection after: {}", command.verb(), e);
                self.attempt(slot, command).await
            }
            other => other,
        }
    }

    async fn attempt(&self, slot: &mut Option<AsyncConnection>, command: &Command) -> Result<Response> {
        // Held locally until the reply is complete, so a dropped future
        // takes the connection down with it
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => AsyncConnection::connect(&self.config).await?,
        };

        match conn.execute(command, self.config.request_timeout()).await {
            Ok(response) => {
                *slot = Some(conn);
                Ok(response)
            }
            Err(e) => {
                tracing::debug!("Discarding connection to {}: {}", conn.peer_addr(), e);
                Err(e)
            }
        }
    }
}
