//! Error types for LruKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for LruKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    /// A put whose key or value exceeds the size limit
    #[error("Key or value too long")]
    TooLong { key_len: usize, value_len: usize },

    /// A frame whose declared lengths exceed the size limit.
    ///
    /// Raised by the decoder before any payload byte is read, so the
    /// declared payload is still pending on the stream.
    #[error("Key or value too long")]
    FrameTooLong { key_len: usize, value_len: usize },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Unknown command")]
    UnknownCommand(u8),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An ERROR frame received from the server
    #[error("Server error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// Whether the error belongs to the transport rather than the request.
    ///
    /// Transport errors end a connection; everything else is answered with
    /// an ERROR frame.
    pub fn is_transport(&self) -> bool {
        matches!(self, KvError::Io(_))
    }
}
