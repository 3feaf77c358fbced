//! LruKV CLI Client
//!
//! Command-line interface for interacting with LruKV.

use clap::{Parser, Subcommand};
use lrukv::client::{is_miss, Client};

/// LruKV CLI
#[derive(Parser, Debug)]
#[command(name = "lrukv-cli")]
#[command(about = "CLI for the LruKV cache")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7171")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Put a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Put { key, value } => client
            .put(key.as_bytes(), value.as_bytes())
            .map(|()| "OK".to_string()),
        Commands::Get { key } => client.get(key.as_bytes()).map(|value| {
            if is_miss(&value) {
                "(miss)".to_string()
            } else {
                String::from_utf8_lossy(&value).into_owned()
            }
        }),
    };

    match outcome {
        Ok(line) => println!("{}", line),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
