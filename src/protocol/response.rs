//! Response definitions
//!
//! Represents replies read from the server.

use bytes::Bytes;

/// Reply status codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// `VA <len>` - value follows
    Value,
    /// `HD` - success, no value
    Header,
    /// `EN` - miss on `mg`
    Miss,
    /// `NF` - not found
    NotFound,
    /// `NS` - not stored
    NotStored,
    /// `EX` - CAS mismatch
    Exists,
    /// `MN` - reply to `mn`
    Noop,
    /// `OK` - reply to `flush_all`
    Ok,
    /// `ERROR`
    Error,
    /// `CLIENT_ERROR <msg>`
    ClientError(String),
    /// `SERVER_ERROR <msg>`
    ServerError(String),
}

impl Status {
    /// Wire token for the status, without any message
    pub fn token(&self) -> &'static str {
        match self {
            Status::Value => "VA",
            Status::Header => "HD",
            Status::Miss => "EN",
            Status::NotFound => "NF",
            Status::NotStored => "NS",
            Status::Exists => "EX",
            Status::Noop => "MN",
            Status::Ok => "OK",
            Status::Error => "ERROR",
            Status::ClientError(_) => "CLIENT_ERROR",
            Status::ServerError(_) => "SERVER_ERROR",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Status::Error | Status::ClientError(_) | Status::ServerError(_)
        )
    }
}

/// Remaining lifetime reported by the `t` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Seconds until expiry
    Remaining(u32),
    /// `t-1`: the item never expires
    Never,
}

/// A flag returned on a reply line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFlag {
    /// `c<token>`
    Cas(u64),
    /// `t<secs>` or `t-1`
    Ttl(Ttl),
    /// `h0` / `h1`
    HitBefore(bool),
    /// `l<secs>`
    LastAccess(u64),
    /// `s<bytes>`
    Size(u64),
    /// `k<key>`
    Key(Bytes),
    /// `f<flags>`
    ClientFlags(u32),
    /// `O<opaque>`
    Opaque(Bytes),
    /// `b` - the echoed key is base64
    Base64Key,
    /// `W` - this client won the right to recache
    Won,
    /// `X` - the item is stale
    Stale,
    /// `Z` - another client already won the recache
    AlreadyWon,
}

/// Status line with its flags and declared value length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: Status,
    pub flags: Vec<ResponseFlag>,
    /// Declared byte length of the value block, present only for `VA`
    pub value_len: Option<usize>,
}

impl ResponseHeader {
    /// Finish a header that has no value block
    pub fn into_response(self) -> Response {
        Response {
            status: self.status,
            flags: self.flags,
            payload: None,
        }
    }
}

/// A fully decoded reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Returned flags, in wire order
    pub flags: Vec<ResponseFlag>,

    /// Value bytes, present only for `VA`
    pub payload: Option<Bytes>,
}

impl Response {
    pub fn cas(&self) -> Option<u64> {
        self.flags.iter().find_map(|f| match f {
            ResponseFlag::Cas(v) => Some(*v),
            _ => None,
        })
    }

    pub fn ttl(&self) -> Option<Ttl> {
        self.flags.iter().find_map(|f| match f {
            ResponseFlag::Ttl(v) => Some(*v),
            _ => None,
        })
    }

    pub fn hit_before(&self) -> Option<bool> {
        self.flags.iter().find_map(|f| match f {
            ResponseFlag::HitBefore(v) => Some(*v),
            _ => None,
        })
    }

    pub fn last_access(&self) -> Option<u64> {
        self.flags.iter().find_map(|f| match f {
            ResponseFlag::LastAccess(v) => Some(*v),
            _ => None,
        })
    }

    pub fn size(&self) -> Option<u64> {
        self.flags.iter().find_map(|f| match f {
            ResponseFlag::Size(v) => Some(*v),
            _ => None,
        })
    }

    pub fn key(&self) -> Option<&Bytes> {
        self.flags.iter().find_map(|f| match f {
            ResponseFlag::Key(v) => Some(v),
            _ => None,
        })
    }

    pub fn client_flags(&self) -> Option<u32> {
        self.flags.iter().find_map(|f| match f {
            ResponseFlag::ClientFlags(v) => Some(*v),
            _ => None,
        })
    }

    pub fn has_flag(&self, flag: &ResponseFlag) -> bool {
        self.flags.contains(flag)
    }
}
