//! Blocking Connection
//!
//! One TCP connection with its read buffer, driven by the calling thread.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};

use crate::config::ClientConfig;
use crate::error::{MetaError, Result};
use crate::protocol::{attach_value, decode_header, encode_command, take_line, Command, Response, CRLF};
use super::RequestState;

/// Bytes pulled from the socket per read
pub(crate) const READ_CHUNK: usize = 16 * 1024;

/// A blocking connection to one server
pub struct Connection {
    /// TCP stream, used for both directions
    stream: TcpStream,

    /// Bytes received but not yet consumed by the decoder
    read_buf: BytesMut,

    /// Where the current request is in its lifecycle
    state: RequestState,

    /// Deadline of the request in flight
    deadline: Option<Instant>,
    timeout_ms: u64,

    max_value_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Open a connection to `config.addr`, trying each resolved address in turn
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let addrs: Vec<SocketAddr> = config.addr.to_socket_addrs()?.collect();

        let mut last_err = None;
        for addr in addrs {
            let attempt = match config.connect_timeout() {
                Some(limit) => TcpStream::connect_timeout(&addr, limit),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream, config),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(MetaError::Connection(last_err.unwrap_or_else(|| {
            io::Error::new(
                ErrorKind::AddrNotAvailable,
                format!("{} resolved to no addresses", config.addr),
            )
        })))
    }

    /// Wrap an already-connected stream
    pub fn from_stream(stream: TcpStream, config: &ClientConfig) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(config.tcp_nodelay)?;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            state: RequestState::Idle,
            deadline: None,
            timeout_ms: 0,
            max_value_size: config.max_value_size,
            peer_addr,
        })
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Run one request/reply exchange under an optional deadline
    ///
    /// Any error leaves the connection `Failed`; the caller must drop it.
    pub fn execute(&mut self, command: &Command, timeout: Option<Duration>) -> Result<Response> {
        if !self.state.is_reusable() {
            return Err(MetaError::Connection(io::Error::new(
                ErrorKind::Other,
                format!("connection to {} is {}", self.peer_addr, self.state),
            )));
        }

        self.deadline = timeout.map(|limit| Instant::now() + limit);
        self.timeout_ms = timeout.map(|limit| limit.as_millis() as u64).unwrap_or(0);

        let result = self.exchange(command);
        self.deadline = None;

        match result {
            Ok(response) => {
                self.transition(RequestState::Complete);
                Ok(response)
            }
            Err(e) => {
                self.transition(RequestState::Failed);
                Err(e)
            }
        }
    }

    fn exchange(&mut self, command: &Command) -> Result<Response> {
        self.transition(RequestState::Sending);
        self.send(&encode_command(command))?;

        self.transition(RequestState::AwaitingStatusLine);
        let line = self.receive_line()?;
        let header = decode_header(&line, self.max_value_size)?;

        let response = match header.value_len {
            None => header.into_response(),
            Some(len) => {
                self.transition(RequestState::AwaitingPayload);
                let block = self.receive_exact(len + CRLF.len())?;
                attach_value(header, block)?
            }
        };

        if !self.read_buf.is_empty() {
            return Err(MetaError::Protocol(format!(
                "{} unsolicited bytes after reply",
                self.read_buf.len()
            )));
        }

        Ok(response)
    }

    // =========================================================================
    // I/O Primitives
    // =========================================================================

    /// Write all bytes to the socket
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let remaining = self.remaining()?;
        self.stream.set_write_timeout(remaining)?;
        self.stream.write_all(bytes).map_err(|e| self.io_failure(e))
    }

    /// Read one CRLF-terminated line, returned without the CRLF
    pub fn receive_line(&mut self) -> Result<Bytes> {
        loop {
            if let Some(line) = take_line(&mut self.read_buf)? {
                return Ok(line);
            }
            self.fill()?;
        }
    }

    /// Read exactly `n` bytes
    pub fn receive_exact(&mut self, n: usize) -> Result<Bytes> {
        if self.read_buf.len() < n {
            self.read_buf.reserve(n - self.read_buf.len());
        }
        while self.read_buf.len() < n {
            self.fill()?;
        }
        Ok(self.read_buf.split_to(n).freeze())
    }

    /// Close the socket in both directions
    pub fn close(self) {
        tracing::debug!("Closing connection to {}", self.peer_addr);
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn fill(&mut self) -> Result<()> {
        let remaining = self.remaining()?;
        self.stream.set_read_timeout(remaining)?;

        let mut chunk = [0u8; READ_CHUNK];
        let n = loop {
            match self.stream.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.io_failure(e)),
            }
        };

        if n == 0 {
            return Err(self.state.interrupted(false, self.timeout_ms));
        }
        self.read_buf.extend_from_slice(&chunk[..n]);
        Ok(())
    }

    /// Time left before the deadline; an expired deadline is an error
    fn remaining(&self) -> Result<Option<Duration>> {
        match self.deadline {
            None => Ok(None),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    Err(self.state.interrupted(true, self.timeout_ms))
                } else {
                    Ok(Some(deadline - now))
                }
            }
        }
    }

    fn io_failure(&self, err: io::Error) -> MetaError {
        match err.kind() {
            // Unix reports socket timeouts as WouldBlock, Windows as TimedOut
            ErrorKind::WouldBlock | ErrorKind::TimedOut => self.state.interrupted(true, self.timeout_ms),
            _ => MetaError::Connection(err),
        }
    }

    fn transition(&mut self, next: RequestState) {
        tracing::trace!("{}: {} -> {}", self.peer_addr, self.state, next);
        self.state = next;
    }
}
