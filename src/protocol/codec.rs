//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬─────────────────────────────────────────────┐
//! │ Cmd (1)  │                  Fields                     │
//! └──────────┴─────────────────────────────────────────────┘
//! ```
//!
//! ### Fields by Command Type
//! - PUT: key_len (2) + value_len (2) + key + value
//! - GET: key_len (2) + key
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (2)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//! Length and payload are absent for the OK answer to a PUT, so a
//! response can only be decoded knowing which command it answers.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{KvError, Result};
use crate::store::{MAX_KEY_LEN, MAX_VALUE_LEN};
use super::{Command, CommandType, Response, Status};

/// Largest value a u16 length field can carry
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Size of one length field
const LEN_SIZE: usize = 2;

// =============================================================================
// Shared helpers
// =============================================================================

fn put_len(buf: &mut BytesMut, len: usize) -> Result<()> {
    let len = u16::try_from(len).map_err(|_| {
        KvError::Protocol(format!(
            "Field of {} bytes exceeds protocol ceiling of {} bytes",
            len, MAX_FIELD_LEN
        ))
    })?;
    buf.put_u16(len);
    Ok(())
}

fn get_len(buf: &mut &[u8], what: &str) -> Result<usize> {
    if buf.remaining() < LEN_SIZE {
        return Err(KvError::Protocol(format!("Incomplete frame: missing {} length", what)));
    }
    Ok(buf.get_u16() as usize)
}

fn get_bytes(buf: &mut &[u8], len: usize, what: &str) -> Result<Vec<u8>> {
    if buf.remaining() < len {
        return Err(KvError::Protocol(format!(
            "Incomplete frame: {} expected {} bytes, got {}",
            what,
            len,
            buf.remaining()
        )));
    }
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    Ok(bytes)
}

fn expect_consumed(buf: &[u8]) -> Result<()> {
    if !buf.is_empty() {
        return Err(KvError::Protocol(format!(
            "Trailing {} bytes after frame",
            buf.len()
        )));
    }
    Ok(())
}

/// Reject declared lengths before any payload is read
fn check_frame_limits(key_len: usize, value_len: usize) -> Result<()> {
    if key_len > MAX_KEY_LEN || value_len > MAX_VALUE_LEN {
        return Err(KvError::FrameTooLong { key_len, value_len });
    }
    Ok(())
}

fn read_len<R: Read>(reader: &mut R) -> Result<usize> {
    let mut len = [0u8; LEN_SIZE];
    reader.read_exact(&mut len)?;
    Ok(u16::from_be_bytes(len) as usize)
}

fn read_payload<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; len];
    if len > 0 {
        reader.read_exact(&mut payload)?;
    }
    Ok(payload)
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    buf.put_u8(command.command_type() as u8);

    match command {
        Command::Put { key, value } => {
            buf.reserve(2 * LEN_SIZE + key.len() + value.len());
            put_len(&mut buf, key.len())?;
            put_len(&mut buf, value.len())?;
            buf.put_slice(key);
            buf.put_slice(value);
        }
        Command::Get { key } => {
            buf.reserve(LEN_SIZE + key.len());
            put_len(&mut buf, key.len())?;
            buf.put_slice(key);
        }
    }

    Ok(buf.to_vec())
}

/// Decode one complete command frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let mut buf = bytes;
    if !buf.has_remaining() {
        return Err(KvError::Protocol("Incomplete frame: empty".to_string()));
    }

    let command = match CommandType::try_from(buf.get_u8())? {
        CommandType::Put => {
            let key_len = get_len(&mut buf, "key")?;
            let value_len = get_len(&mut buf, "value")?;
            check_frame_limits(key_len, value_len)?;
            let key = get_bytes(&mut buf, key_len, "key")?;
            let value = get_bytes(&mut buf, value_len, "value")?;
            Command::Put { key, value }
        }
        CommandType::Get => {
            let key_len = get_len(&mut buf, "key")?;
            check_frame_limits(key_len, 0)?;
            let key = get_bytes(&mut buf, key_len, "key")?;
            Command::Get { key }
        }
    };

    expect_consumed(buf)?;
    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) [+ payload_len (2) + payload]
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let payload_len = response.payload.as_ref().map_or(0, |p| p.len());

    let mut buf = BytesMut::with_capacity(1 + LEN_SIZE + payload_len);
    buf.put_u8(response.status as u8);

    if let Some(payload) = &response.payload {
        put_len(&mut buf, payload.len())?;
        buf.put_slice(payload);
    }

    Ok(buf.to_vec())
}

/// Decode a response to a command of type `answered`
pub fn decode_response(bytes: &[u8], answered: CommandType) -> Result<Response> {
    let mut buf = bytes;
    if !buf.has_remaining() {
        return Err(KvError::Protocol("Incomplete response: empty".to_string()));
    }

    let status = parse_status(buf.get_u8())?;
    let payload = if has_body(status, answered) {
        let len = get_len(&mut buf, "payload")?;
        Some(get_bytes(&mut buf, len, "payload")?)
    } else {
        None
    };

    expect_consumed(buf)?;
    Ok(Response { status, payload })
}

fn parse_status(byte: u8) -> Result<Status> {
    match byte {
        0x01 => Ok(Status::Ok),
        0x02 => Ok(Status::Error),
        _ => Err(KvError::Protocol(format!(
            "Unknown response status: 0x{:02x}",
            byte
        ))),
    }
}

fn has_body(status: Status, answered: CommandType) -> bool {
    !(status == Status::Ok && answered == CommandType::Put)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read the command byte that starts a frame
///
/// Returns `None` when the peer closed the stream cleanly before sending
/// anything.
pub fn read_command_byte<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read the fields following a command byte
///
/// Lengths are validated before the payload is read: an oversized
/// declaration yields [`KvError::FrameTooLong`] with the payload still
/// unread on the stream. A short read surfaces as `KvError::Io`.
pub fn read_command_body<R: Read>(reader: &mut R, command_type: CommandType) -> Result<Command> {
    match command_type {
        CommandType::Put => {
            let key_len = read_len(reader)?;
            let value_len = read_len(reader)?;
            check_frame_limits(key_len, value_len)?;
            let key = read_payload(reader, key_len)?;
            let value = read_payload(reader, value_len)?;
            Ok(Command::Put { key, value })
        }
        CommandType::Get => {
            let key_len = read_len(reader)?;
            check_frame_limits(key_len, 0)?;
            let key = read_payload(reader, key_len)?;
            Ok(Command::Get { key })
        }
    }
}

/// Read a complete command from a stream
///
/// Returns `None` on a clean close before the command byte.
pub fn read_command<R: Read>(reader: &mut R) -> Result<Option<Command>> {
    let Some(byte) = read_command_byte(reader)? else {
        return Ok(None);
    };
    let command_type = CommandType::try_from(byte)?;
    read_command_body(reader, command_type).map(Some)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read the response to a command of type `answered`
pub fn read_response<R: Read>(reader: &mut R, answered: CommandType) -> Result<Response> {
    let mut status = [0u8; 1];
    reader.read_exact(&mut status)?;
    let status = parse_status(status[0])?;

    let payload = if has_body(status, answered) {
        let len = read_len(reader)?;
        Some(read_payload(reader, len)?)
    } else {
        None
    };

    Ok(Response { status, payload })
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
