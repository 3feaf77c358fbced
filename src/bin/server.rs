//! LruKV Server Binary
//!
//! Starts the TCP server for LruKV.

use std::sync::Arc;
use clap::Parser;
use lrukv::{Config, Store};
use lrukv::network::Server;
use tracing_subscriber::{fmt, EnvFilter};

/// LruKV Server
#[derive(Parser, Debug)]
#[command(name = "lrukv-server")]
#[command(about = "Bounded in-memory LRU key-value cache over TCP")]
#[command(version)]
struct Args {
    /// Listen host
    #[arg(long, env = "LRUKV_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Listen port
    #[arg(short, long, env = "LRUKV_PORT", default_value = "7171")]
    port: u16,

    /// Maximum number of entries before LRU eviction
    #[arg(short, long, env = "MAX_CACHE_SIZE", default_value = "10000")]
    capacity: usize,

    /// Maximum concurrent connections (unbounded when omitted)
    #[arg(short, long, env = "LRUKV_MAX_CONNECTIONS")]
    max_connections: Option<usize>,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lrukv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("LruKV Server v{}", lrukv::VERSION);

    // Build config from args
    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .capacity(args.capacity)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let store = match Store::new(config.capacity) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to create store: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, store) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
