//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor loop
//! - One thread per connection, no ceiling unless configured
//! - Every connection shares the same `Arc<Store>`

mod server;
mod connection;
mod limiter;

pub use server::Server;
pub use connection::Connection;
pub use limiter::{ConnectionLimiter, Permit};
