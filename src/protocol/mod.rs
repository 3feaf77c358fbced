//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (length-prefixed binary, big-endian u16 lengths)
//!
//! ### Request Format
//! ```text
//! PUT ┌──────────┬────────────┬────────────┬─────────┬───────────┐
//!     │ 0x01 (1) │ KeyLen (2) │ ValLen (2) │   Key   │   Value   │
//!     └──────────┴────────────┴────────────┴─────────┴───────────┘
//! GET ┌──────────┬────────────┬─────────┐
//!     │ 0x02 (1) │ KeyLen (2) │   Key   │
//!     └──────────┴────────────┴─────────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌───────────┬──────────┬─────────────────┐
//! │ Status(1) │ Len (2)  │     Payload     │
//! └───────────┴──────────┴─────────────────┘
//! ```
//! A PUT acknowledgement is the status byte alone.
//!
//! ### Status Codes
//! - 0x01: OK (a GET miss is OK with the payload `Key not found`)
//! - 0x02: ERROR

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    encode_command, decode_command, encode_response, decode_response,
    read_command_byte, read_command_body, read_command, write_command,
    read_response, write_response, MAX_FIELD_LEN,
};
