//! # LruKV
//!
//! A bounded in-memory key-value cache with:
//! - Least-recently-used eviction at a fixed entry capacity
//! - 256-byte limits on keys and values
//! - A length-prefixed binary protocol over TCP
//! - One handler thread per client connection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (accept loop, thread per client)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Connection Handler                          │
//! │        read cmd byte → decode → execute → respond            │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐               ┌──────────────────┐
//!   │      Codec      │               │      Store       │
//!   │ (pure, no I/O)  │               │ (LRU, one Mutex) │
//!   └─────────────────┘               └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use store::{Lookup, Store};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LruKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
