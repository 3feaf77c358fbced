//! Connection Handler
//!
//! Handles individual client connections.
//!
//! ## Per-connection state machine
//! ```text
//!   ReadCommand ──byte──▶ Dispatch ──▶ Respond ──┐
//!        ▲                                       │
//!        └───────────────────────────────────────┘
//!   clean close / transport error ──▶ Closed
//! ```

use std::io::{self, BufReader, BufWriter, ErrorKind, Read};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{KvError, Result};
use crate::protocol::{read_command_body, read_command_byte, write_response};
use crate::protocol::{Command, CommandType, Response};
use crate::store::Store;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared store
    store: Arc<Store>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on two handles of the same socket
    pub fn new(stream: TcpStream, store: Arc<Store>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves the direction unbounded)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns `Ok` when the peer goes away, `Err` on any other transport
    /// failure. Request-level failures are answered with ERROR frames and
    /// never end the loop.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            // ReadCommand
            let byte = match read_command_byte(&mut self.reader) {
                Ok(Some(byte)) => byte,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) => return self.transport_failed(e, "reading"),
            };

            // Dispatch
            let response = match CommandType::try_from(byte) {
                Ok(command_type) => match self.process(command_type) {
                    Ok(response) => response,
                    Err(e) if e.is_transport() => return self.transport_failed(e, "reading"),
                    Err(e) => Response::error(&e.to_string()),
                },
                Err(e) => {
                    tracing::debug!("Unknown command 0x{:02x} from {}", byte, self.peer_addr);
                    Response::error(&e.to_string())
                }
            };

            // Respond
            if let Err(e) = write_response(&mut self.writer, &response) {
                return self.transport_failed(e, "writing");
            }
        }
    }

    /// Decode the frame for `command_type` and run it against the store
    fn process(&mut self, command_type: CommandType) -> Result<Response> {
        let command = match read_command_body(&mut self.reader, command_type) {
            Ok(command) => command,
            Err(err @ KvError::FrameTooLong { key_len, value_len }) => {
                // Skip the declared payload so the next frame lines up
                self.discard(key_len + value_len)?;
                return Err(err);
            }
            Err(e) => return Err(e),
        };

        tracing::trace!("Received command from {}: {:?}", self.peer_addr, command.command_type());
        Ok(self.execute(command))
    }

    /// Execute a command and return a response
    fn execute(&self, command: Command) -> Response {
        match command {
            Command::Put { key, value } => match self.store.put(&key, &value) {
                Ok(()) => Response::ok(None),
                Err(e) => Response::error(&e.to_string()),
            },
            Command::Get { key } => Response::ok(Some(self.store.get(&key).into_wire_value())),
        }
    }

    /// Read and drop `len` bytes without buffering them
    fn discard(&mut self, len: usize) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.reader).take(len as u64), &mut io::sink())?;
        if skipped < len as u64 {
            return Err(KvError::Io(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("stream ended after {} of {} discarded bytes", skipped, len),
            )));
        }
        Ok(())
    }

    /// Map a transport failure to the connection's exit status
    fn transport_failed(&self, e: KvError, during: &str) -> Result<()> {
        if let KvError::Io(ref io_err) = e {
            if is_disconnect(io_err.kind()) {
                tracing::debug!("Client {} gone while {}: {}", self.peer_addr, during, e);
                return Ok(());
            }
        }
        tracing::warn!("Error {} {}: {}", during, self.peer_addr, e);
        Err(e)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Error kinds that mean the peer went away (or idled past a timeout)
fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}
