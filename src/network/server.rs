//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::error::Result;
use crate::store::Store;
use super::connection::Connection;
use super::limiter::{ConnectionLimiter, Permit};

/// TCP server for LruKV
pub struct Server {
    config: Config,
    store: Arc<Store>,
    listener: TcpListener,
    limiter: Option<ConnectionLimiter>,
}

impl Server {
    /// Bind the listen socket described by `config`
    pub fn bind(config: Config, store: Arc<Store>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.listen_addr())?;
        let limiter = config.max_connections.map(ConnectionLimiter::new);

        tracing::info!(
            "Listening on {} (capacity {}, max connections {})",
            listener.local_addr()?,
            store.capacity(),
            config
                .max_connections
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );

        Ok(Self {
            config,
            store,
            listener,
            limiter,
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared store handle
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Start the accept loop (blocking, never returns on its own)
    pub fn run(&self) -> Result<()> {
        let mut next_id: u64 = 0;

        loop {
            // With a ceiling configured, wait for a free slot before accepting
            let permit = self.limiter.as_ref().map(ConnectionLimiter::acquire);

            let stream = match self.listener.accept() {
                Ok((stream, _)) => stream,
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            next_id += 1;
            self.spawn_handler(next_id, stream, permit);
        }
    }

    /// Run the accept loop on a background thread
    ///
    /// Returns the bound address; the loop lives until the process exits.
    pub fn spawn(self) -> Result<SocketAddr> {
        let addr = self.local_addr()?;
        thread::Builder::new()
            .name("lrukv-acceptor".to_string())
            .spawn(move || {
                if let Err(e) = self.run() {
                    tracing::error!("Server error: {}", e);
                }
            })?;
        Ok(addr)
    }

    fn spawn_handler(&self, id: u64, stream: TcpStream, permit: Option<Permit>) {
        let store = Arc::clone(&self.store);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let spawned = thread::Builder::new()
            .name(format!("lrukv-conn-{}", id))
            .spawn(move || {
                let _permit = permit;

                let mut connection = match Connection::new(stream, Arc::clone(&store)) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!("Failed to set up connection {}: {}", id, e);
                        return;
                    }
                };
                if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
                    tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
                    return;
                }

                // Errors were already logged by the handler
                let _ = connection.handle();

                let stats = store.stats();
                tracing::debug!(
                    entries = stats.entries,
                    hits = stats.hits,
                    misses = stats.misses,
                    evictions = stats.evictions,
                    "Connection {} closed",
                    connection.peer_addr()
                );
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn handler thread for connection {}: {}", id, e);
        }
    }
}
