//! Client SDK
//!
//! Blocking client for the wire protocol. A [`Client`] keeps one
//! connection open and can issue any number of requests over it; the
//! `*_once` helpers open a fresh connection per call.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{KvError, Result};
use crate::protocol::{read_response, write_command, Command, Response};
use crate::store::MISS_MARKER;

/// Connection to a LruKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Store a key-value pair
    ///
    /// An ERROR frame (e.g. an oversized key) comes back as
    /// [`KvError::Remote`].
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let response = self.request(Command::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        into_result(response).map(|_| ())
    }

    /// Fetch a value
    ///
    /// A miss is not an error: the server answers OK with the miss marker,
    /// which [`is_miss`] recognizes.
    pub fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let response = self.request(Command::Get { key: key.to_vec() })?;
        into_result(response).map(Option::unwrap_or_default)
    }

    /// Send one command and read its response
    pub fn request(&mut self, command: Command) -> Result<Response> {
        let command_type = command.command_type();
        write_command(&mut self.writer, &command)?;
        read_response(&mut self.reader, command_type)
    }

    /// `put` over a connection of its own
    pub fn put_once<A: ToSocketAddrs>(addr: A, key: &[u8], value: &[u8]) -> Result<()> {
        Self::connect(addr)?.put(key, value)
    }

    /// `get` over a connection of its own
    pub fn get_once<A: ToSocketAddrs>(addr: A, key: &[u8]) -> Result<Vec<u8>> {
        Self::connect(addr)?.get(key)
    }
}

/// Whether a GET result is the server's miss marker
pub fn is_miss(value: &[u8]) -> bool {
    value == MISS_MARKER
}

fn into_result(response: Response) -> Result<Option<Vec<u8>>> {
    if response.is_ok() {
        Ok(response.payload)
    } else {
        Err(KvError::Remote(response.payload_text()))
    }
}

