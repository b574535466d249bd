//! Async Connection
//!
//! The same exchange as [`Connection`](super::Connection), suspending the
//! task instead of the thread. The only await points are the socket write
//! and the socket reads; encoding and decoding run synchronously.

use std::io::{self, ErrorKind};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::ClientConfig;
use crate::error::{MetaError, Result};
use crate::protocol::{attach_value, decode_header, encode_command, take_line, Command, Response, CRLF};
use super::connection::READ_CHUNK;
use super::RequestState;

/// An async connection to one server
pub struct AsyncConnection {
    stream: TcpStream,
    read_buf: BytesMut,
    state: RequestState,
    max_value_size: usize,
    peer_addr: String,
}

impl AsyncConnection {
    /// Open a connection to `config.addr`
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let connect = TcpStream::connect(config.addr.as_str());

        let stream = match config.connect_timeout() {
            Some(limit) => match tokio::time::timeout(limit, connect).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(MetaError::Connection(io::Error::new(
                        ErrorKind::TimedOut,
                        format!("connect to {} timed out", config.addr),
                    )))
                }
            },
            None => connect.await?,
        };

        Self::from_stream(stream, config)
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
    /// On timeout the in-flight exchange is dropped where it stood and the
    /// connection is left `Failed`.
    pub async fn execute(&mut self, command: &Command, timeout: Option<Duration>) -> Result<Response> {
        if !self.state.is_reusable() {
            return Err(MetaError::Connection(io::Error::new(
                ErrorKind::Other,
                format!("connection to {} is {}", self.peer_addr, self.state),
            )));
        }

        let result = match timeout {
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, self.exchange(command)).await;
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(self.state.interrupted(true, limit.as_millis() as u64)),
                }
            }
            None => self.exchange(command).await,
        };

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

    async fn exchange(&mut self, command: &Command) -> Result<Response> {
        self.transition(RequestState::Sending);
        let bytes = encode_command(command);
        self.send(&bytes).await?;

        self.transition(RequestState::AwaitingStatusLine);
        let line = self.receive_line().await?;
        let header = decode_header(&line, self.max_value_size)?;

        let response = match header.value_len {
            None => header.into_response(),
            Some(len) => {
                self.transition(RequestState::AwaitingPayload);
                let block = self.receive_exact(len + CRLF.len()).await?;
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
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    /// Read one CRLF-terminated line, returned without the CRLF
    pub async fn receive_line(&mut self) -> Result<Bytes> {
        loop {
            if let Some(line) = take_line(&mut self.read_buf)? {
                return Ok(line);
            }
            self.fill().await?;
        }
    }

    /// Read exactly `n` bytes
    pub async fn receive_exact(&mut self, n: usize) -> Result<Bytes> {
        if self.read_buf.len() < n {
            self.read_buf.reserve(n - self.read_buf.len());
        }
        while self.read_buf.len() < n {
            self.fill().await?;
        }
        Ok(self.read_buf.split_to(n).freeze())
    }

    /// Close the socket
    pub async fn close(mut self) {
        tracing::debug!("Closing connection to {}", self.peer_addr);
        let _ = self.stream.shutdown().await;
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn fill(&mut self) -> Result<()> {
        self.read_buf.reserve(READ_CHUNK);
        let n = self.stream.read_buf(&mut self.read_buf).await?;
        if n == 0 {
            return Err(self.state.interrupted(false, 0));
        }
        Ok(())
    }

    fn transition(&mut self, next: RequestState) {
        tracing::trace!("{}: {} -> {}", self.peer_addr, self.state, next);
        self.state = next;
    }
}
