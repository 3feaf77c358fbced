//! LruKV Load Generator
//!
//! Hammers a running server from several threads with a 40/60 PUT/GET mix
//! and checks every GET against what this process wrote.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use clap::Parser;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::seq::IteratorRandom;
use rand::Rng;
use tracing_subscriber::{fmt, EnvFilter};

use lrukv::client::{is_miss, Client};

/// LruKV load generator
#[derive(Parser, Debug)]
#[command(name = "lrukv-loadgen")]
#[command(about = "Concurrent PUT/GET load against a LruKV server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7171")]
    server: String,

    /// Number of client threads
    #[arg(short, long, default_value = "10")]
    threads: usize,

    /// Requests per thread
    #[arg(short, long, default_value = "1000")]
    requests: usize,

    /// Fraction of requests that are PUTs
    #[arg(long, default_value = "0.4")]
    put_ratio: f64,
}

/// Per-thread outcome counts
#[derive(Debug, Default)]
struct Tally {
    requests: u64,
    failures: u64,
    mismatches: u64,
    misses: u64,
    elapsed: Duration,
}

/// Keys written by this run and their last written values
type Written = Mutex<HashMap<String, String>>;

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

fn run_worker(id: usize, args: &Args, written: &Written) -> Tally {
    let mut tally = Tally::default();
    let mut client = match Client::connect(&args.server) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("[worker {}] failed to connect: {}", id, e);
            tally.failures = args.requests as u64;
            return tally;
        }
    };

    let start = Instant::now();
    for _ in 0..args.requests {
        tally.requests += 1;

        if rand::thread_rng().gen_bool(args.put_ratio) {
            let key = random_string(10);
            let value = random_string(10);
            match client.put(key.as_bytes(), value.as_bytes()) {
                Ok(()) => {
                    written.lock().insert(key, value);
                }
                Err(e) => {
                    tally.failures += 1;
                    tracing::warn!("[worker {}] PUT {} failed: {}", id, key, e);
                }
            }
            continue;
        }

        let picked = written.lock().keys().choose(&mut rand::thread_rng()).cloned();
        let key = picked.unwrap_or_else(|| random_string(10));

        match client.get(key.as_bytes()) {
            Ok(value) if is_miss(&value) => tally.misses += 1,
            Ok(value) => {
                let expected = written.lock().get(&key).cloned();
                if expected.as_deref().map(str::as_bytes) != Some(value.as_slice()) {
                    tally.mismatches += 1;
                    tracing::warn!(
                        "[worker {}] value mismatch for {}: expected {:?}, got {:?}",
                        id,
                        key,
                        expected,
                        String::from_utf8_lossy(&value)
                    );
                }
            }
            Err(e) => {
                tally.failures += 1;
                tracing::warn!("[worker {}] GET {} failed: {}", id, key, e);
            }
        }
    }
    tally.elapsed = start.elapsed();

    tracing::info!(
        "[worker {}] {} requests in {:.2?} ({} failed, {} mismatched, {} missed)",
        id,
        tally.requests,
        tally.elapsed,
        tally.failures,
        tally.mismatches,
        tally.misses
    );
    tally
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_thread_ids(true).init();

    let args = Args::parse();
    let written: Written = Mutex::new(HashMap::new());

    let start = Instant::now();
    let tallies = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = (0..args.threads)
            .map(|id| {
                let args = &args;
                let written = &written;
                s.spawn(move |_| run_worker(id, args, written))
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .collect::<Vec<_>>()
    });
    let elapsed = start.elapsed();

    let tallies = match tallies {
        Ok(t) => t,
        Err(_) => {
            tracing::error!("A worker thread panicked");
            std::process::exit(1);
        }
    };

    let requests: u64 = tallies.iter().map(|t| t.requests).sum();
    let failures: u64 = tallies.iter().map(|t| t.failures).sum();
    let mismatches: u64 = tallies.iter().map(|t| t.mismatches).sum();
    let misses: u64 = tallies.iter().map(|t| t.misses).sum();

    tracing::info!(
        "Total: {} requests in {:.2?}, {:.2} req/s ({} failed, {} mismatched, {} missed)",
        requests,
        elapsed,
        requests as f64 / elapsed.as_secs_f64(),
        failures,
        mismatches,
        misses
    );

    if failures > 0 || mismatches > 0 {
        std::process::exit(1);
    }
}
