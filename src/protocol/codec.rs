//! Protocol codec
//!
//! Encoding and decoding functions for the meta text protocol. Nothing here
//! waits on I/O: the connection layer feeds bytes in and pulls lines and
//! value blocks out.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! <verb> <key> <flag>*\r\n                          (mg, md, ma)
//! ms <key> <datalen> <flag>*\r\n<data>\r\n          (ms)
//! mn\r\n
//! flush_all [delay]\r\n
//! ```
//!
//! ### Response Format
//! ```text
//! VA <datalen> <flag>*\r\n<data>\r\n
//! HD|EN|NF|NS|EX|MN <flag>*\r\n
//! OK\r\n | ERROR\r\n | CLIENT_ERROR <msg>\r\n | SERVER_ERROR <msg>\r\n
//! ```

use std::str::FromStr;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{MetaError, Result};
use super::{Command, Response, ResponseFlag, ResponseHeader, Status, Ttl, Verb};

/// Line terminator for every request and reply line
pub const CRLF: &[u8] = b"\r\n";

/// Longest status line accepted before the stream is declared corrupt
pub const MAX_LINE_LEN: usize = 8 * 1024;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a command to bytes
///
/// Keyed verbs render `<verb> <key>`, `ms` adds the declared value length,
/// then each flag token in the command's canonical order.
pub fn encode_command(command: &Command) -> Vec<u8> {
    let value_len = command.payload().map(|p| p.len()).unwrap_or(0);
    let mut buf = Vec::with_capacity(16 + command.key().len() + command.flags().len() * 8 + value_len);

    buf.extend_from_slice(command.verb().as_bytes());

    if command.verb().takes_key() {
        buf.push(b' ');
        buf.extend_from_slice(command.key());
    }

    if command.verb() == Verb::FlushAll {
        if let Some(delay) = command.delay() {
            buf.push(b' ');
            buf.extend_from_slice(delay.to_string().as_bytes());
        }
    }

    if let Some(payload) = command.payload() {
        buf.push(b' ');
        buf.extend_from_slice(payload.len().to_string().as_bytes());
    }

    for flag in command.flags() {
        buf.push(b' ');
        flag.write_token(&mut buf);
    }
    buf.extend_from_slice(CRLF);

    if let Some(payload) = command.payload() {
        buf.extend_from_slice(payload);
        buf.extend_from_slice(CRLF);
    }

    buf
}

// =============================================================================
// Line Framing
// =============================================================================

/// Locate the CRLF ending the first line in `buf`
///
/// Returns the index of the `\r`, or `None` if the line is not complete yet.
pub fn find_line_end(buf: &[u8]) -> Result<Option<usize>> {
    match buf.iter().position(|&b| b == b'\n') {
        Some(0) => Err(MetaError::Protocol("line not terminated by CRLF".to_string())),
        Some(i) if buf[i - 1] != b'\r' => {
            Err(MetaError::Protocol("line not terminated by CRLF".to_string()))
        }
        Some(i) if i - 1 > MAX_LINE_LEN => Err(MetaError::Protocol(format!(
            "status line exceeds {} bytes",
            MAX_LINE_LEN
        ))),
        Some(i) => Ok(Some(i - 1)),
        None if buf.len() > MAX_LINE_LEN => Err(MetaError::Protocol(format!(
            "status line exceeds {} bytes",
            MAX_LINE_LEN
        ))),
        None => Ok(None),
    }
}

/// Split the first complete line off `buf`, without its CRLF
pub fn take_line(buf: &mut BytesMut) -> Result<Option<Bytes>> {
    match find_line_end(buf)? {
        Some(end) => {
            let line = buf.split_to(end).freeze();
            buf.advance(CRLF.len());
            Ok(Some(line))
        }
        None => Ok(None),
    }
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Parse a status line (without CRLF) into a header
pub fn decode_header(line: &[u8], max_value_size: usize) -> Result<ResponseHeader> {
    let mut tokens = line.split(|&b| b == b' ').filter(|t| !t.is_empty());

    let status_token = tokens
        .next()
        .ok_or_else(|| MetaError::Protocol("empty status line".to_string()))?;

    let (status, value_len) = match status_token {
        b"VA" => {
            let len_token = tokens
                .next()
                .ok_or_else(|| MetaError::Protocol("VA reply missing value length".to_string()))?;
            let len: usize = parse_number(len_token, "value length")?;
            if len > max_value_size {
                return Err(MetaError::Protocol(format!(
                    "value too large: {} bytes (max {})",
                    len, max_value_size
                )));
            }
            (Status::Value, Some(len))
        }
        b"HD" => (Status::Header, None),
        b"EN" => (Status::Miss, None),
        b"NF" => (Status::NotFound, None),
        b"NS" => (Status::NotStored, None),
        b"EX" => (Status::Exists, None),
        b"MN" => (Status::Noop, None),
        b"OK" => (Status::Ok, None),
        b"ERROR" => {
            return Ok(header(Status::Error));
        }
        b"CLIENT_ERROR" => {
            return Ok(header(Status::ClientError(message_after(line, status_token))));
        }
        b"SERVER_ERROR" => {
            return Ok(header(Status::ServerError(message_after(line, status_token))));
        }
        other => {
            return Err(MetaError::Protocol(format!(
                "unknown status {:?}",
                String::from_utf8_lossy(other)
            )))
        }
    };

    let flags = tokens.map(parse_flag).collect::<Result<Vec<_>>>()?;

    Ok(ResponseHeader {
        status,
        flags,
        value_len,
    })
}

/// Combine a `VA` header with its value block (value bytes plus CRLF)
pub fn attach_value(header: ResponseHeader, block: Bytes) -> Result<Response> {
    let len = header.value_len.unwrap_or(0);
    if block.len() != len + CRLF.len() || &block[len..] != CRLF {
        return Err(MetaError::Framing(format!(
            "value block of {} bytes not terminated by CRLF",
            len
        )));
    }

    Ok(Response {
        status: header.status,
        flags: header.flags,
        payload: Some(block.slice(..len)),
    })
}

/// Decode one complete response from the front of `buf`
///
/// Returns `Ok(None)` without consuming anything when more bytes are needed.
pub fn decode_response(buf: &mut BytesMut, max_value_size: usize) -> Result<Option<Response>> {
    let line_end = match find_line_end(buf)? {
        Some(end) => end,
        None => return Ok(None),
    };

    let header = decode_header(&buf[..line_end], max_value_size)?;
    let line_len = line_end + CRLF.len();

    match header.value_len {
        None => {
            buf.advance(line_len);
            Ok(Some(header.into_response()))
        }
        Some(len) => {
            if buf.len() < line_len + len + CRLF.len() {
                return Ok(None);
            }
            buf.advance(line_len);
            let block = buf.split_to(len + CRLF.len()).freeze();
            attach_value(header, block).map(Some)
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn header(status: Status) -> ResponseHeader {
    ResponseHeader {
        status,
        flags: Vec::new(),
        value_len: None,
    }
}

fn message_after(line: &[u8], status_token: &[u8]) -> String {
    let start = line.iter().position(|&b| b != b' ').unwrap_or(0) + status_token.len();
    let rest = line.get(start..).unwrap_or_default();
    String::from_utf8_lossy(rest).trim().to_string()
}

fn parse_number<T: FromStr>(token: &[u8], what: &str) -> Result<T> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            MetaError::Protocol(format!(
                "invalid {}: {:?}",
                what,
                String::from_utf8_lossy(token)
            ))
        })
}

fn parse_flag(token: &[u8]) -> Result<ResponseFlag> {
    let (code, arg) = (token[0], &token[1..]);

    let flag = match code {
        b'c' => ResponseFlag::Cas(parse_number(arg, "cas token")?),
        b't' if arg == b"-1" => ResponseFlag::Ttl(Ttl::Never),
        b't' => ResponseFlag::Ttl(Ttl::Remaining(parse_number(arg, "ttl")?)),
        b'h' => match arg {
            b"0" => ResponseFlag::HitBefore(false),
            b"1" => ResponseFlag::HitBefore(true),
            _ => {
                return Err(MetaError::Protocol(format!(
                    "invalid hit-before flag: {:?}",
                    String::from_utf8_lossy(token)
                )))
            }
        },
        b'l' => ResponseFlag::LastAccess(parse_number(arg, "last access")?),
        b's' => ResponseFlag::Size(parse_number(arg, "size")?),
        b'f' => ResponseFlag::ClientFlags(parse_number(arg, "client flags")?),
        b'k' if !arg.is_empty() => ResponseFlag::Key(Bytes::copy_from_slice(arg)),
        b'O' => ResponseFlag::Opaque(Bytes::copy_from_slice(arg)),
        b'b' if arg.is_empty() => ResponseFlag::Base64Key,
        b'W' if arg.is_empty() => ResponseFlag::Won,
        b'X' if arg.is_empty() => ResponseFlag::Stale,
        b'Z' if arg.is_empty() => ResponseFlag::AlreadyWon,
        _ => {
            return Err(MetaError::Protocol(format!(
                "unknown flag token {:?}",
                String::from_utf8_lossy(token)
            )))
        }
    };

    Ok(flag)
}
