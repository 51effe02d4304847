//! Codec Tests
//!
//! Tests for RESP request decoding, reply encoding, and the client-side
//! reply decoder.

use std::io::Cursor;

use bytes::BytesMut;
use rockredis::arena::Arena;
use rockredis::protocol::{
    decode_reply, encode_request, read_request, write_reply, Reply, Request, Value,
};
use rockredis::RockError;

// =============================================================================
// Helper Functions
// =============================================================================

fn decode_one(input: &[u8]) -> (Arena, Request) {
    let mut reader = Cursor::new(input.to_vec());
    let mut arena = Arena::new(256);
    let mut request = Request::new();
    assert!(read_request(&mut reader, &mut arena, &mut request).unwrap());
    (arena, request)
}

fn decode_err(input: &[u8]) -> RockError {
    let mut reader = Cursor::new(input.to_vec());
    let mut arena = Arena::new(256);
    let mut request = Request::new();
    read_request(&mut reader, &mut arena, &mut request).unwrap_err()
}

fn args(arena: &Arena, request: &Request) -> Vec<Vec<u8>> {
    request
        .args
        .iter()
        .map(|a| arena.bytes(a).unwrap().to_vec())
        .collect()
}

fn encode(arena: &Arena, reply: &Reply) -> Vec<u8> {
    let mut out = Vec::new();
    write_reply(&mut out, arena, reply).unwrap();
    out
}

// =============================================================================
// Request Decoding
// =============================================================================

#[test]
fn test_decode_request() {
    let (arena, request) = decode_one(b"*3\r\n$5\r\nrpush\r\n$2\r\nmy\r\n$3\r\nabc\r\n");

    assert_eq!(request.name, "RPUSH");
    assert_eq!(request.raw_name, "rpush");
    assert_eq!(request.sent_name(), "rpush");
    assert_eq!(request.argc(), 3);
    assert_eq!(args(&arena, &request), vec![b"my".to_vec(), b"abc".to_vec()]);
}

#[test]
fn test_decode_binary_safe_argument() {
    let (arena, request) = decode_one(b"*2\r\n$4\r\nECHO\r\n$4\r\na\r\nb\r\n");
    assert_eq!(args(&arena, &request), vec![b"a\r\nb".to_vec()]);
}

#[test]
fn test_decode_empty_argument() {
    let (arena, request) = decode_one(b"*2\r\n$3\r\nGET\r\n$0\r\n\r\n");
    assert_eq!(args(&arena, &request), vec![Vec::<u8>::new()]);
}

#[test]
fn test_decode_matches_client_encoding() {
    let wire = encode_request(&[b"lrange", b"key", b"0", b"-1"]);
    let (arena, request) = decode_one(&wire);

    assert_eq!(request.name, "LRANGE");
    assert_eq!(
        args(&arena, &request),
        vec![b"key".to_vec(), b"0".to_vec(), b"-1".to_vec()]
    );
}

#[test]
fn test_pipelined_requests_reuse_request() {
    let mut wire = encode_request(&[b"PING"]);
    wire.extend(encode_request(&[b"GET", b"k"]));
    let mut reader = Cursor::new(wire);
    let mut arena = Arena::new(256);
    let mut request = Request::new();

    assert!(read_request(&mut reader, &mut arena, &mut request).unwrap());
    assert_eq!(request.name, "PING");
    assert!(request.args.is_empty());

    arena.reset();
    assert!(read_request(&mut reader, &mut arena, &mut request).unwrap());
    assert_eq!(request.name, "GET");
    assert_eq!(args(&arena, &request), vec![b"k".to_vec()]);

    assert!(!read_request(&mut reader, &mut arena, &mut request).unwrap());
}

#[test]
fn test_clean_eof_returns_false() {
    let mut reader = Cursor::new(Vec::new());
    let mut arena = Arena::new(16);
    let mut request = Request::new();
    assert!(!read_request(&mut reader, &mut arena, &mut request).unwrap());
}

#[test]
fn test_decode_errors() {
    for input in [
        &b"PING\r\n"[..],                 // inline commands are not accepted
        b"*0\r\n",                        // empty request
        b"*x\r\n",                        // bad count
        b"*1\r\n:5\r\n",                  // wrong element type
        b"*1\r\n$4\r\nPING",              // missing CRLF after payload
        b"*1\r\n$4\r\nPINGxx",            // wrong terminator
        b"*2\r\n$4\r\nECHO\r\n",          // truncated request
        b"*1\r\n$99999999999\r\nx\r\n",   // payload too large
        b"*1\n",                          // bare LF
    ] {
        let err = decode_err(input);
        assert!(
            matches!(err, RockError::Protocol(_)),
            "input {:?} gave {:?}",
            String::from_utf8_lossy(input),
            err
        );
    }
}

// =============================================================================
// Reply Encoding
// =============================================================================

#[test]
fn test_encode_scalar_replies() {
    let arena = Arena::new(16);

    assert_eq!(encode(&arena, &Reply::ok()), b"+OK\r\n");
    assert_eq!(encode(&arena, &Reply::Status("PONG")), b"+PONG\r\n");
    assert_eq!(encode(&arena, &Reply::Integer(-3)), b":-3\r\n");
    assert_eq!(encode(&arena, &Reply::count(7u32)), b":7\r\n");
    assert_eq!(encode(&arena, &Reply::Null), b"$-1\r\n");
    assert_eq!(encode(&arena, &Reply::NullArray), b"*-1\r\n");
}

#[test]
fn test_encode_bulk_and_multibulk() {
    let mut arena = Arena::new(64);
    let a = arena.copy_from(b"hello");
    let b = arena.copy_from(b"");

    assert_eq!(encode(&arena, &Reply::Bulk(a)), b"$5\r\nhello\r\n");
    assert_eq!(
        encode(&arena, &Reply::MultiBulk(vec![a, b])),
        b"*2\r\n$5\r\nhello\r\n$0\r\n\r\n"
    );
    assert_eq!(encode(&arena, &Reply::MultiBulk(Vec::new())), b"*0\r\n");
}

#[test]
fn test_encode_error_reply() {
    let arena = Arena::new(16);
    let reply = Reply::from(&RockError::WrongArity("get".to_string()));

    assert!(reply.is_error());
    assert_eq!(
        encode(&arena, &reply),
        b"-ERR wrong number of arguments for 'get' command\r\n"
    );
}

#[test]
fn test_encode_stale_bulk_fails() {
    let mut arena = Arena::new(16);
    let buf = arena.copy_from(b"x");
    arena.reset();

    let mut out = Vec::new();
    assert!(write_reply(&mut out, &arena, &Reply::Bulk(buf)).is_err());
}

// =============================================================================
// Client Decoding
// =============================================================================

#[test]
fn test_client_decodes_every_reply_kind() {
    let mut buf = BytesMut::from(
        &b"+OK\r\n-ERR boom\r\n:42\r\n$3\r\nabc\r\n$-1\r\n*2\r\n$1\r\na\r\n:1\r\n*-1\r\n*0\r\n"[..],
    );

    let expected = vec![
        Value::Status("OK".to_string()),
        Value::Error("ERR boom".to_string()),
        Value::Integer(42),
        Value::Bulk(b"abc".to_vec()),
        Value::Null,
        Value::Array(vec![Value::Bulk(b"a".to_vec()), Value::Integer(1)]),
        Value::NullArray,
        Value::Array(Vec::new()),
    ];

    for value in expected {
        assert_eq!(decode_reply(&mut buf).unwrap(), Some(value));
    }
    assert!(buf.is_empty());
    assert_eq!(decode_reply(&mut buf).unwrap(), None);
}

#[test]
fn test_client_waits_for_complete_frame() {
    let mut buf = BytesMut::from(&b"*2\r\n$1\r\na\r\n$1\r"[..]);
    assert_eq!(decode_reply(&mut buf).unwrap(), None);

    buf.extend_from_slice(b"\nb\r\n");
    assert_eq!(
        decode_reply(&mut buf).unwrap(),
        Some(Value::Array(vec![
            Value::Bulk(b"a".to_vec()),
            Value::Bulk(b"b".to_vec())
        ]))
    );
}

#[test]
fn test_server_replies_roundtrip_through_client() {
    let mut arena = Arena::new(64);
    let x = arena.copy_from(b"x");
    let y = arena.copy_from(b"yy");

    let mut wire = Vec::new();
    for reply in [
        Reply::MultiBulk(vec![x, y]),
        Reply::Null,
        Reply::count(3u32),
    ] {
        write_reply(&mut wire, &arena, &reply).unwrap();
    }

    let mut buf = BytesMut::from(&wire[..]);
    assert_eq!(
        decode_reply(&mut buf).unwrap(),
        Some(Value::Array(vec![Value::Bulk(b"x".to_vec()), Value::Bulk(b"yy".to_vec())]))
    );
    assert_eq!(decode_reply(&mut buf).unwrap(), Some(Value::Null));
    assert_eq!(decode_reply(&mut buf).unwrap(), Some(Value::Integer(3)));
}

#[test]
fn test_value_display() {
    assert_eq!(Value::Integer(3).to_string(), "(integer) 3");
    assert_eq!(Value::Null.to_string(), "(nil)");
    assert_eq!(Value::Array(Vec::new()).to_string(), "(empty array)");
}
