//! Configuration for mcmeta clients
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Largest item memcached accepts with its default slab settings
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Client configuration shared by the blocking and async adapters
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Endpoint
    // -------------------------------------------------------------------------
    /// Server address (host:port)
    pub addr: String,

    /// Disable Nagle's algorithm on the socket
    pub tcp_nodelay: bool,

    // -------------------------------------------------------------------------
    // Timeouts (0 disables)
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Per-request timeout covering send and full reply (milliseconds)
    pub request_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Item Defaults
    // -------------------------------------------------------------------------
    /// TTL in seconds applied to stores that don't specify one (0 = never expire)
    pub default_ttl: u32,

    /// Largest value the client will send or accept (bytes)
    pub max_value_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:11211".to_string(),
            tcp_nodelay: true,
            connect_timeout_ms: 1000,
            request_timeout_ms: 1000,
            default_ttl: 0,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Config for `addr` with every other setting defaulted
    pub fn for_addr(addr: impl Into<String>) -> Self {
        Self::builder().addr(addr).build()
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        millis(self.request_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server address (host:port)
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.config.addr = addr.into();
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.config.tcp_nodelay = enabled;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the per-request timeout (in milliseconds)
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    /// Set the default TTL for stores (in seconds)
    pub fn default_ttl(mut self, seconds: u32) -> Self {
        self.config.default_ttl = seconds;
        self
    }

    /// Set the maximum value size (in bytes)
    pub fn max_value_size(mut self, size: usize) -> Self {
        self.config.max_value_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
