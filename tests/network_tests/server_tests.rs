//! Server Tests
//!
//! Drive a live server over raw TCP sockets and check exact response bytes:
//! - PUT/GET hit and miss
//! - Validation errors keep the connection open
//! - Unknown commands keep the connection open
//! - Oversized length fields are rejected without desyncing the stream
//! - Truncated frames tear the connection down without a response
//! - Connections do not affect each other

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use lrukv::network::Server;
use lrukv::{Config, Store};

// =============================================================================
// Helper Functions
// =============================================================================

fn start_server(capacity: usize) -> (SocketAddr, Arc<Store>) {
    let config = Config::builder().port(0).capacity(capacity).build();
    let store = Arc::new(Store::new(capacity).unwrap());
    let server = Server::bind(config, Arc::clone(&store)).unwrap();
    let addr = server.spawn().unwrap();
    (addr, store)
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream
}

fn put_frame(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x01];
    frame.extend_from_slice(&(key.len() as u16).to_be_bytes());
    frame.extend_from_slice(&(value.len() as u16).to_be_bytes());
    frame.extend_from_slice(key);
    frame.extend_from_slice(value);
    frame
}

fn get_frame(key: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x02];
    frame.extend_from_slice(&(key.len() as u16).to_be_bytes());
    frame.extend_from_slice(key);
    frame
}

/// Read one status byte plus a length-prefixed body
fn read_body_response(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let mut header = [0u8; 3];
    stream.read_exact(&mut header).unwrap();
    let len = u16::from_be_bytes([header[1], header[2]]) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).unwrap();
    (header[0], body)
}

fn read_put_ack(stream: &mut TcpStream) -> u8 {
    let mut status = [0u8; 1];
    stream.read_exact(&mut status).unwrap();
    status[0]
}

// =============================================================================
// Request/Response Tests
// =============================================================================

#[test]
fn test_put_then_get() {
    let (addr, _) = start_server(16);
    let mut stream = connect(addr);

    stream.write_all(&put_frame(b"foo", b"bar")).unwrap();
    assert_eq!(read_put_ack(&mut stream), 0x01);

    stream.write_all(&get_frame(b"foo")).unwrap();
    assert_eq!(read_body_response(&mut stream), (0x01, b"bar".to_vec()));
}

#[test]
fn test_get_missing_returns_marker() {
    let (addr, _) = start_server(16);
    let mut stream = connect(addr);

    stream.write_all(&get_frame(b"missing")).unwrap();
    assert_eq!(read_body_response(&mut stream), (0x01, b"Key not found".to_vec()));
}

#[test]
fn test_key_too_long_keeps_connection() {
    let (addr, store) = start_server(16);
    let mut stream = connect(addr);

    let key = vec![b'k'; 300];
    stream.write_all(&put_frame(&key, b"x")).unwrap();
    assert_eq!(
        read_body_response(&mut stream),
        (0x02, b"Key or value too long".to_vec())
    );
    assert_eq!(store.len(), 0);

    // Still in sync: the next frame is parsed from its first byte
    stream.write_all(&put_frame(b"after", b"ok")).unwrap();
    assert_eq!(read_put_ack(&mut stream), 0x01);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_get_key_too_long_keeps_connection() {
    let (addr, _) = start_server(16);
    let mut stream = connect(addr);

    stream.write_all(&get_frame(&vec![b'k'; 257])).unwrap();
    let (status, body) = read_body_response(&mut stream);
    assert_eq!(status, 0x02);
    assert_eq!(body, b"Key or value too long");

    stream.write_all(&get_frame(b"k")).unwrap();
    assert_eq!(read_body_response(&mut stream).0, 0x01);
}

#[test]
fn test_unknown_command_keeps_connection() {
    let (addr, store) = start_server(16);
    let mut stream = connect(addr);

    stream.write_all(&[0x09]).unwrap();
    assert_eq!(read_body_response(&mut stream), (0x02, b"Unknown command".to_vec()));

    stream.write_all(&put_frame(b"k", b"v")).unwrap();
    assert_eq!(read_put_ack(&mut stream), 0x01);
    assert!(store.contains(b"k"));
}

#[test]
fn test_pipelined_requests() {
    let (addr, _) = start_server(16);
    let mut stream = connect(addr);

    let mut batch = put_frame(b"a", b"1");
    batch.extend(put_frame(b"b", b"2"));
    batch.extend(get_frame(b"a"));
    batch.extend(get_frame(b"c"));
    stream.write_all(&batch).unwrap();

    assert_eq!(read_put_ack(&mut stream), 0x01);
    assert_eq!(read_put_ack(&mut stream), 0x01);
    assert_eq!(read_body_response(&mut stream), (0x01, b"1".to_vec()));
    assert_eq!(read_body_response(&mut stream), (0x01, b"Key not found".to_vec()));
}

// =============================================================================
// Eviction Over the Wire
// =============================================================================

#[test]
fn test_lru_eviction_scenario() {
    let (addr, store) = start_server(2);
    let mut stream = connect(addr);

    for (k, v) in [(b"a", b"1"), (b"b", b"2")] {
        stream.write_all(&put_frame(k, v)).unwrap();
        assert_eq!(read_put_ack(&mut stream), 0x01);
    }

    stream.write_all(&get_frame(b"a")).unwrap();
    assert_eq!(read_body_response(&mut stream), (0x01, b"1".to_vec()));

    stream.write_all(&put_frame(b"c", b"3")).unwrap();
    assert_eq!(read_put_ack(&mut stream), 0x01);

    stream.write_all(&get_frame(b"b")).unwrap();
    assert_eq!(read_body_response(&mut stream), (0x01, b"Key not found".to_vec()));
    stream.write_all(&get_frame(b"a")).unwrap();
    assert_eq!(read_body_response(&mut stream), (0x01, b"1".to_vec()));
    stream.write_all(&get_frame(b"c")).unwrap();
    assert_eq!(read_body_response(&mut stream), (0x01, b"3".to_vec()));

    assert_eq!(store.len(), 2);
}

// =============================================================================
// Transport Error Tests
// =============================================================================

#[test]
fn test_truncated_frame_closes_without_response() {
    let (addr, store) = start_server(16);
    let mut stream = connect(addr);

    // PUT declaring 3+3 bytes, only 2 sent, then half-close
    stream.write_all(&[0x01, 0x00, 0x03, 0x00, 0x03, b'f', b'o']).unwrap();
    stream.shutdown(Shutdown::Write).unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_clean_close_sends_nothing() {
    let (addr, _) = start_server(16);
    let mut stream = connect(addr);

    stream.shutdown(Shutdown::Write).unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn test_broken_connection_does_not_affect_others() {
    let (addr, _) = start_server(16);

    let mut good = connect(addr);
    good.write_all(&put_frame(b"shared", b"value")).unwrap();
    assert_eq!(read_put_ack(&mut good), 0x01);

    {
        let mut bad = connect(addr);
        bad.write_all(&[0x02, 0x00, 0x10, b'x']).unwrap();
        // dropped mid-frame
    }

    let mut other = connect(addr);
    other.write_all(&get_frame(b"shared")).unwrap();
    assert_eq!(read_body_response(&mut other), (0x01, b"value".to_vec()));

    good.write_all(&get_frame(b"shared")).unwrap();
    assert_eq!(read_body_response(&mut good), (0x01, b"value".to_vec()));
}

// =============================================================================
// Connection Ceiling
// =============================================================================

#[test]
fn test_connection_ceiling_defers_extra_clients() {
    let config = Config::builder()
        .port(0)
        .capacity(16)
        .max_connections(Some(1))
        .build();
    let store = Arc::new(Store::new(16).unwrap());
    let addr = Server::bind(config, store).unwrap().spawn().unwrap();

    let mut first = connect(addr);
    first.write_all(&get_frame(b"k")).unwrap();
    assert_eq!(read_body_response(&mut first).0, 0x01);

    // Second client connects (kernel backlog) but is not served yet
    let mut second = connect(addr);
    second
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    second.write_all(&get_frame(b"k")).unwrap();
    let mut byte = [0u8; 1];
    assert!(second.read(&mut byte).is_err());

    // Releasing the first slot lets the second through
    drop(first);
    second.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    assert_eq!(read_body_response(&mut second).0, 0x01);
}
