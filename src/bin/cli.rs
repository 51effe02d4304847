//! rockredis CLI Client
//!
//! Sends one command and prints the reply, redis-cli style:
//!
//! ```text
//! rockredis-cli rpush mylist a b c
//! rockredis-cli lrange mylist 0 -1
//! ```

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::ExitCode;

use bytes::BytesMut;
use clap::Parser;
use rockredis::protocol::{decode_reply, encode_request, Value};
use rockredis::{Result, RockError};

/// rockredis CLI
#[derive(Parser, Debug)]
#[command(name = "rockredis-cli")]
#[command(about = "CLI for the rockredis server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Command and its arguments, e.g. `lpush mylist a b`
    #[arg(required = true, num_args = 1..)]
    command: Vec<String>,
}

fn run(args: &Args) -> Result<Value> {
    let mut stream = TcpStream::connect(&args.server)
        .map_err(|e| RockError::Network(format!("connect {}: {}", args.server, e)))?;

    let parts: Vec<&[u8]> = args.command.iter().map(|s| s.as_bytes()).collect();
    stream.write_all(&encode_request(&parts))?;

    let mut buf = BytesMut::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(value) = decode_reply(&mut buf)? {
            return Ok(value);
        }
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(RockError::Network("server closed the connection".to_string()));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(value) => {
            println!("{}", value);
            if matches!(value, Value::Error(_)) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
