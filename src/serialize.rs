//! Value serialization
//!
//! Maps typed values to stored bytes plus the client-flags word memcached
//! keeps beside each item, and back again on read.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MetaError, Result};

/// Raw bytes, stored as-is
pub const FLAG_BYTES: u32 = 0;
/// bincode-encoded serde value
pub const FLAG_ENCODED: u32 = 1 << 0;
/// Signed integer as decimal text
pub const FLAG_INT: u32 = 1 << 1;
/// UTF-8 string
pub const FLAG_STR: u32 = 1 << 4;

/// A value with a known storage representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bytes(Bytes),
    Int(i64),
    Str(String),
    /// Output of [`Value::encode`]
    Encoded(Bytes),
}

impl Value {
    /// Encode any serde value with bincode
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Value::Encoded(Bytes::from(bincode::serialize(value)?)))
    }

    /// Decode an [`Value::Encoded`] value back into `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Value::Encoded(data) => Ok(bincode::deserialize(data)?),
            other => Err(MetaError::Serialization(format!(
                "value stored with client flags {} is not an encoded value",
                other.client_flags()
            ))),
        }
    }

    pub fn client_flags(&self) -> u32 {
        match self {
            Value::Bytes(_) => FLAG_BYTES,
            Value::Int(_) => FLAG_INT,
            Value::Str(_) => FLAG_STR,
            Value::Encoded(_) => FLAG_ENCODED,
        }
    }

    /// Bytes to store and the client flags to store them with
    pub fn dump(&self) -> (Bytes, u32) {
        let data = match self {
            Value::Bytes(b) | Value::Encoded(b) => b.clone(),
            Value::Int(n) => Bytes::from(n.to_string()),
            Value::Str(s) => Bytes::from(s.clone()),
        };
        (data, self.client_flags())
    }

    /// Rebuild a value from stored bytes and client flags
    pub fn load(data: Bytes, flags: u32) -> Result<Self> {
        match flags {
            FLAG_BYTES => Ok(Value::Bytes(data)),
            FLAG_ENCODED => Ok(Value::Encoded(data)),
            FLAG_INT => std::str::from_utf8(&data)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .map(Value::Int)
                .ok_or_else(|| MetaError::Serialization("stored integer is not decimal text".to_string())),
            FLAG_STR => String::from_utf8(data.to_vec())
                .map(Value::Str)
                .map_err(|e| MetaError::Serialization(format!("stored string is not UTF-8: {}", e))),
            other => Err(MetaError::Serialization(format!(
                "unrecognized client flags: {}",
                other
            ))),
        }
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
