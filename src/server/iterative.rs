//! # Servidor Iterativo
//! src/server/iterative.rs
//!
//! Variante degenerada del multiplexor: una conexión a la vez, sin conjunto
//! de conexiones. Accept bloqueante, un read acotado, la respuesta fija si
//! hubo datos, y cerrar. Mientras se atiende a un peer, los demás esperan en
//! el backlog.

use crate::http::Response;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use tracing::{debug, info, warn};

/// Resultado de atender una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// Se leyeron `received` bytes y se envió la respuesta
    Responded { peer: SocketAddr, received: usize },

    /// El peer cerró sin enviar nada
    Hangup { peer: SocketAddr },
}

/// Acepta y atiende una sola conexión
///
/// El socket del peer se cierra al retornar, con o sin error.
pub fn serve_one(
    listener: &TcpListener,
    buffer: &mut [u8],
    response: &[u8],
) -> io::Result<Served> {
    let (mut stream, peer) = listener.accept()?;
    info!(%peer, "Nueva conexión");

    let received = stream.read(buffer)?;
    if received == 0 {
        info!(%peer, "Conexión cerrada sin datos");
        return Ok(Served::Hangup { peer });
    }

    debug!(
        %peer,
        bytes = received,
        payload = %String::from_utf8_lossy(&buffer[..received]),
        "Mensaje recibido"
    );
    stream.write_all(response)?;
    info!(%peer, "Respuesta enviada, cerrando");

    Ok(Served::Responded { peer, received })
}

/// Atiende conexiones una tras otra hasta que el proceso termine
///
/// Los errores de una conexión se registran y se pasa a la siguiente.
pub fn serve_forever(listener: TcpListener, buffer_size: usize, response: &Response) -> ! {
    let response = response.to_bytes();
    let mut buffer = vec![0u8; buffer_size.max(1)];

    info!("Modo iterativo: una conexión a la vez");
    loop {
        if let Err(e) = serve_one(&listener, &mut buffer, &response) {
            warn!(error = %e, "Error atendiendo la conexión");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ListeningEndpoint;
    use std::net::{Ipv4Addr, TcpStream};
    use std::thread;

    fn listener() -> TcpListener {
        ListeningEndpoint::start(Ipv4Addr::LOCALHOST, 0, 4)
            .unwrap()
            .into_listener()
    }

    #[test]
    fn test_serve_one_responds_and_closes() {
        let listener = listener();
        let addr = listener.local_addr().unwrap();
        let response = Response::default().to_bytes();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).unwrap();
            received
        });

        let mut buffer = [0u8; 1024];
        let served = serve_one(&listener, &mut buffer, &response).unwrap();

        assert!(matches!(served, Served::Responded { received: 18, .. }));
        assert_eq!(client.join().unwrap(), response);
    }

    #[test]
    fn test_serve_one_peer_closed_immediately() {
        let listener = listener();
        let addr = listener.local_addr().unwrap();

        // Cliente que conecta y cierra sin mandar datos
        drop(TcpStream::connect(addr).unwrap());

        let mut buffer = [0u8; 16];
        let served = serve_one(&listener, &mut buffer, b"unused").unwrap();
        assert!(matches!(served, Served::Hangup { .. }));
    }

    #[test]
    fn test_serve_one_truncates_to_buffer() {
        let listener = listener();
        let addr = listener.local_addr().unwrap();
        let response = Response::default().to_bytes();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(&[b'x'; 100]).unwrap();
            let mut received = Vec::new();
            // El servidor cierra con datos sin leer: puede llegar un RST
            let _ = stream.read_to_end(&mut received);
        });

        let mut buffer = [0u8; 8];
        let served = serve_one(&listener, &mut buffer, &response).unwrap();
        assert!(matches!(served, Served::Responded { received, .. } if received <= 8));

        client.join().unwrap();
    }
}
