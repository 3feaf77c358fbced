//! Command definitions
//!
//! Represents requests from clients.

use crate::error::KvError;

/// Command types (first byte of every request frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Put = 0x01,
    Get = 0x02,
}

impl TryFrom<u8> for CommandType {
    type Error = KvError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(CommandType::Put),
            0x02 => Ok(CommandType::Get),
            other => Err(KvError::UnknownCommand(other)),
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Get a value by key
    Get { key: Vec<u8> },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Put { .. } => CommandType::Put,
            Command::Get { .. } => CommandType::Get,
        }
    }
}
