//! # Cliente Bloqueante
//! src/client.rs
//!
//! Conecta, envía un request con forma HTTP y hace un único receive
//! acotado. No espera a que el servidor cierre ni reintenta.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tracing::debug;

/// Request que envía el cliente por defecto
pub const DEFAULT_REQUEST: &[u8] = b"GET / HTTP/1.1\r\n\
Content-Type: text/plain\r\n\
\r\n";

/// Tamaño por defecto del buffer de respuesta
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Envía `request` a `addr` y retorna lo que llegue en un solo receive
///
/// # Ejemplo
/// ```no_run
/// use mux_server::client::{send_request, DEFAULT_REQUEST, DEFAULT_BUFFER_SIZE};
///
/// let addr = "127.0.0.1:8080".parse().unwrap();
/// let reply = send_request(addr, DEFAULT_REQUEST, DEFAULT_BUFFER_SIZE, None).unwrap();
/// println!("Server replied: {}", String::from_utf8_lossy(&reply));
/// ```
pub fn send_request(
    addr: SocketAddr,
    request: &[u8],
    buffer_size: usize,
    timeout: Option<Duration>,
) -> io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;
    debug!(%addr, bytes = request.len(), "Enviando request");

    stream.write_all(request)?;

    let mut buffer = vec![0u8; buffer_size.max(1)];
    let received = stream.read(&mut buffer)?;
    buffer.truncate(received);
    debug!(%addr, bytes = received, "Respuesta recibida");

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_send_request_single_receive() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 128];
            let n = stream.read(&mut buf).unwrap();
            stream.write_all(b"pong").unwrap();
            buf[..n].to_vec()
        });

        let reply = send_request(addr, DEFAULT_REQUEST, 64, Some(Duration::from_secs(2))).unwrap();

        assert_eq!(reply, b"pong");
        assert_eq!(server.join().unwrap(), DEFAULT_REQUEST);
    }

    #[test]
    fn test_send_request_connection_refused() {
        // Reservar un puerto y liberarlo para que nadie escuche ahí
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

        let result = send_request(addr, DEFAULT_REQUEST, 64, Some(Duration::from_secs(1)));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_request_shape() {
        let text = std::str::from_utf8(DEFAULT_REQUEST).unwrap();
        assert!(text.starts_with("GET / HTTP/1.1\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }
}
