//! Command definitions
//!
//! Represents meta requests sent to the server.

use bytes::Bytes;

use crate::error::{MetaError, Result};

/// Longest key memcached accepts
pub const MAX_KEY_LEN: usize = 250;

/// Request verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `mg` - meta get
    Get,
    /// `ms` - meta set
    Set,
    /// `md` - meta delete
    Delete,
    /// `ma` - meta arithmetic
    Arithmetic,
    /// `mn` - meta no-op
    Noop,
    /// `flush_all` - the one classic verb the meta family has no equivalent for
    FlushAll,
}

impl Verb {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Verb::Get => b"mg",
            Verb::Set => b"ms",
            Verb::Delete => b"md",
            Verb::Arithmetic => b"ma",
            Verb::Noop => b"mn",
            Verb::FlushAll => b"flush_all",
        }
    }

    /// Whether the verb is followed by a key on the wire
    pub fn takes_key(&self) -> bool {
        matches!(self, Verb::Get | Verb::Set | Verb::Delete | Verb::Arithmetic)
    }
}

/// Argument of the `M` flag
///
/// The same letter means different things per verb;
/// [`Command::validate`] rejects modes that don't belong to the verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    // ms modes
    Add,
    Append,
    Prepend,
    Replace,
    Set,
    // ma modes
    Increment,
    Decrement,
}

impl Mode {
    pub fn token(&self) -> u8 {
        match self {
            Mode::Add => b'E',
            Mode::Append => b'A',
            Mode::Prepend => b'P',
            Mode::Replace => b'R',
            Mode::Set => b'S',
            Mode::Increment => b'I',
            Mode::Decrement => b'D',
        }
    }

    pub fn is_store_mode(&self) -> bool {
        !self.is_arithmetic_mode()
    }

    pub fn is_arithmetic_mode(&self) -> bool {
        matches!(self, Mode::Increment | Mode::Decrement)
    }
}

/// A single request flag: a one-letter code plus optional argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// `v` - return the item value
    ReturnValue,
    /// `f` - return client flags
    ReturnClientFlags,
    /// `c` - return CAS token
    ReturnCas,
    /// `t` - return remaining TTL
    ReturnTtl,
    /// `h` - return whether the item was hit before
    ReturnHitBefore,
    /// `l` - return seconds since last access
    ReturnLastAccess,
    /// `s` - return item size
    ReturnSize,
    /// `k` - echo the key
    ReturnKey,
    /// `u` - don't bump the item in the LRU
    NoLruBump,
    /// `I` - invalidate (mark stale) instead of removing
    Invalidate,
    /// `T<secs>` - update / set TTL
    Ttl(u32),
    /// `N<secs>` - vivify on miss with this TTL
    Vivify(u32),
    /// `R<secs>` - win recache if TTL is below this
    Recache(u32),
    /// `C<token>` - compare CAS token
    CompareCas(u64),
    /// `F<flags>` - client flags to store
    ClientFlags(u32),
    /// `M<mode>` - mode switch
    Mode(Mode),
    /// `D<delta>` - arithmetic delta
    Delta(u64),
    /// `J<initial>` - initial value for arithmetic vivify
    Initial(u64),
    /// `O<opaque>` - opaque token echoed back
    Opaque(u32),
}

impl Flag {
    /// One-letter wire code
    pub fn code(&self) -> u8 {
        match self {
            Flag::ReturnValue => b'v',
            Flag::ReturnClientFlags => b'f',
            Flag::ReturnCas => b'c',
            Flag::ReturnTtl => b't',
            Flag::ReturnHitBefore => b'h',
            Flag::ReturnLastAccess => b'l',
            Flag::ReturnSize => b's',
            Flag::ReturnKey => b'k',
            Flag::NoLruBump => b'u',
            Flag::Invalidate => b'I',
            Flag::Ttl(_) => b'T',
            Flag::Vivify(_) => b'N',
            Flag::Recache(_) => b'R',
            Flag::CompareCas(_) => b'C',
            Flag::ClientFlags(_) => b'F',
            Flag::Mode(_) => b'M',
            Flag::Delta(_) => b'D',
            Flag::Initial(_) => b'J',
            Flag::Opaque(_) => b'O',
        }
    }

    /// Append the flag token (code plus argument) to `buf`
    pub fn write_token(&self, buf: &mut Vec<u8>) {
        buf.push(self.code());
        match self {
            Flag::Ttl(n) | Flag::Vivify(n) | Flag::Recache(n) | Flag::ClientFlags(n) | Flag::Opaque(n) => {
                buf.extend_from_slice(n.to_string().as_bytes());
            }
            Flag::CompareCas(n) | Flag::Delta(n) | Flag::Initial(n) => {
                buf.extend_from_slice(n.to_string().as_bytes());
            }
            Flag::Mode(mode) => buf.push(mode.token()),
            _ => {}
        }
    }
}

/// A meta request
///
/// Flags are kept sorted by wire code with at most one flag per code, so two
/// commands built from the same flags in any order encode identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    key: Bytes,
    flags: Vec<Flag>,
    payload: Option<Bytes>,
    delay: Option<u32>,
}

impl Command {
    /// Create a command for a keyed verb
    pub fn new(verb: Verb, key: impl Into<Bytes>) -> Self {
        Self {
            verb,
            key: key.into(),
            flags: Vec::new(),
            payload: None,
            delay: None,
        }
    }

    /// `mn`
    pub fn noop() -> Self {
        Self::new(Verb::Noop, Bytes::new())
    }

    /// `flush_all [delay]`
    pub fn flush_all(delay: Option<u32>) -> Self {
        let mut command = Self::new(Verb::FlushAll, Bytes::new());
        command.delay = delay;
        command
    }

    /// Add a flag, replacing any flag with the same code
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.push_flag(flag);
        self
    }

    pub fn push_flag(&mut self, flag: Flag) {
        match self.flags.binary_search_by_key(&flag.code(), |f| f.code()) {
            Ok(pos) => self.flags[pos] = flag,
            Err(pos) => self.flags.insert(pos, flag),
        }
    }

    /// Attach a value; its length is declared from the bytes themselves
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    pub fn delay(&self) -> Option<u32> {
        self.delay
    }

    pub fn has_flag(&self, code: u8) -> bool {
        self.flags.iter().any(|f| f.code() == code)
    }

    /// Whether replaying the command can't change server state
    ///
    /// `mg` counts as read-only unless it touches (`T`) or vivifies (`N`).
    pub fn is_read_only(&self) -> bool {
        match self.verb {
            Verb::Get => !self.has_flag(b'T') && !self.has_flag(b'N'),
            Verb::Noop => true,
            _ => false,
        }
    }

    /// Reject a command that would not encode as exactly one request
    ///
    /// Keyed verbs need a legal key, and an `M` flag must carry a mode
    /// belonging to the verb.
    pub fn validate(&self) -> Result<()> {
        if self.verb.takes_key() {
            validate_key(&self.key)?;
        } else if !self.key.is_empty() {
            return Err(MetaError::Configuration(format!(
                "{} takes no key",
                String::from_utf8_lossy(self.verb.as_bytes())
            )));
        }

        for flag in &self.flags {
            if let Flag::Mode(mode) = flag {
                let allowed = match self.verb {
                    Verb::Set => mode.is_store_mode(),
                    Verb::Arithmetic => mode.is_arithmetic_mode(),
                    _ => false,
                };
                if !allowed {
                    return Err(MetaError::Configuration(format!(
                        "mode {} does not apply to {}",
                        mode.token() as char,
                        String::from_utf8_lossy(self.verb.as_bytes())
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Check a key against the text protocol's key rules
pub fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(MetaError::Configuration("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(MetaError::Configuration(format!(
            "key too long: {} bytes (max {})",
            key.len(),
            MAX_KEY_LEN
        )));
    }
    if let Some(b) = key.iter().find(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(MetaError::Configuration(format!(
            "key contains illegal byte 0x{:02x}",
            b
        )));
    }
    Ok(())
}
