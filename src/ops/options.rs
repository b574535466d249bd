//! Per-operation options
//!
//! Plain structs with chainable setters. Validation happens when the
//! operation builds its command, not here.

use crate::result::CasToken;

/// Metadata to request on a get
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOptions {
    pub return_cas: bool,
    pub return_ttl: bool,
    pub return_hit_before: bool,
    pub return_last_access: bool,
    pub return_size: bool,
    pub return_key: bool,
    pub no_lru_bump: bool,
    /// Update the TTL while reading (get-and-touch)
    pub touch_ttl: Option<u32>,
    /// On miss, create an empty item with this TTL and win the recache
    pub vivify_on_miss: Option<u32>,
    /// Win the recache if the remaining TTL is below this
    pub recache_threshold: Option<u32>,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cas(mut self) -> Self {
        self.return_cas = true;
        self
    }

    pub fn ttl(mut self) -> Self {
        self.return_ttl = true;
        self
    }

    pub fn hit_before(mut self) -> Self {
        self.return_hit_before = true;
        self
    }

    pub fn last_access(mut self) -> Self {
        self.return_last_access = true;
        self
    }

    pub fn size(mut self) -> Self {
        self.return_size = true;
        self
    }

    pub fn key(mut self) -> Self {
        self.return_key = true;
        self
    }

    pub fn no_lru_bump(mut self) -> Self {
        self.no_lru_bump = true;
        self
    }

    pub fn touch(mut self, ttl: u32) -> Self {
        self.touch_ttl = Some(ttl);
        self
    }

    pub fn vivify_on_miss(mut self, ttl: u32) -> Self {
        self.vivify_on_miss = Some(ttl);
        self
    }

    pub fn recache_threshold(mut self, ttl: u32) -> Self {
        self.recache_threshold = Some(ttl);
        self
    }
}

/// How a store treats an existing (or missing) item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreMode {
    #[default]
    Set,
    /// Fail if the key exists
    Add,
    /// Fail if the key is absent
    Replace,
    Append,
    Prepend,
}

/// Options for `ms`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub mode: StoreMode,
    /// Item TTL; falls back to the client's default TTL
    pub ttl: Option<u32>,
    /// Only store if the item's CAS still matches
    pub cas: Option<CasToken>,
    pub client_flags: u32,
    /// Append/prepend only: create the item with this TTL if missing
    pub vivify_ttl: Option<u32>,
    /// Return the new item's CAS token
    pub return_cas: bool,
}

impl StoreOptions {
    pub fn new(mode: StoreMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn ttl(mut self, ttl: Option<u32>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn cas(mut self, token: CasToken) -> Self {
        self.cas = Some(token);
        self
    }

    pub fn client_flags(mut self, flags: u32) -> Self {
        self.client_flags = flags;
        self
    }

    pub fn vivify_ttl(mut self, ttl: Option<u32>) -> Self {
        self.vivify_ttl = ttl;
        self
    }

    pub fn return_cas(mut self) -> Self {
        self.return_cas = true;
        self
    }
}

/// Options for `md`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub cas: Option<CasToken>,
    /// Mark the item stale instead of removing it
    pub invalidate: bool,
    /// With `invalidate`: how long the stale item lives
    pub stale_ttl: Option<u32>,
}

impl DeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cas(mut self, token: CasToken) -> Self {
        self.cas = Some(token);
        self
    }

    pub fn invalidate(mut self, stale_ttl: Option<u32>) -> Self {
        self.invalidate = true;
        self.stale_ttl = stale_ttl;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArithmeticMode {
    #[default]
    Increment,
    /// Clamps at zero on the server
    Decrement,
}

/// Options for `ma`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticOptions {
    pub mode: ArithmeticMode,
    pub delta: u64,
    /// Value to create a missing counter with; requires `initial_ttl`
    pub initial: Option<u64>,
    /// TTL for a created counter; requires `initial`
    pub initial_ttl: Option<u32>,
    /// New TTL applied on hit
    pub update_ttl: Option<u32>,
}

impl Default for ArithmeticOptions {
    fn default() -> Self {
        Self {
            mode: ArithmeticMode::Increment,
            delta: 1,
            initial: None,
            initial_ttl: None,
            update_ttl: None,
        }
    }
}

impl ArithmeticOptions {
    pub fn incr(delta: u64) -> Self {
        Self {
            mode: ArithmeticMode::Increment,
            delta,
            ..Self::default()
        }
    }

    pub fn decr(delta: u64) -> Self {
        Self {
            mode: ArithmeticMode::Decrement,
            delta,
            ..Self::default()
        }
    }

    pub fn vivify(mut self, initial: u64, ttl: u32) -> Self {
        self.initial = Some(initial);
        self.initial_ttl = Some(ttl);
        self
    }

    pub fn update_ttl(mut self, ttl: u32) -> Self {
        self.update_ttl = Some(ttl);
        self
    }
}
