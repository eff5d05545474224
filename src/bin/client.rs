//! # Cliente - Entry Point
//! src/bin/client.rs
//!
//! Envía un request al servidor e imprime lo que responde.
//!
//! ```bash
//! cargo run --bin client -- --host 127.0.0.1 --port 8080
//! ```

use clap::Parser;
use mux_server::client::{send_request, DEFAULT_BUFFER_SIZE, DEFAULT_REQUEST};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tracing::error;

/// Cliente TCP que envía un único request
#[derive(Debug, Parser)]
#[command(name = "client")]
#[command(about = "Envía un request con forma HTTP y muestra la respuesta")]
struct Args {
    /// IP del servidor
    #[arg(long, default_value = "127.0.0.1", env = "MUX_CLIENT_HOST")]
    host: Ipv4Addr,

    /// Puerto del servidor
    #[arg(short, long, default_value = "8080", env = "MUX_CLIENT_PORT")]
    port: u16,

    /// Tamaño del buffer de respuesta
    #[arg(long = "buffer-size", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Timeout de lectura/escritura en milisegundos (0 = sin timeout)
    #[arg(long = "timeout-ms", default_value = "5000")]
    timeout_ms: u64,
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt().with_target(false).init();

    let addr = SocketAddr::V4(SocketAddrV4::new(args.host, args.port));
    let timeout = (args.timeout_ms > 0).then(|| Duration::from_millis(args.timeout_ms));

    match send_request(addr, DEFAULT_REQUEST, args.buffer_size, timeout) {
        Ok(reply) => println!("Server replied: {}", String::from_utf8_lossy(&reply)),
        Err(e) => {
            error!(%addr, error = %e, "Fallo el request");
            std::process::exit(1);
        }
    }
}
