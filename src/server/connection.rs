//! # Conjunto de Conexiones
//! src/server/connection.rs
//!
//! Reemplaza el bit-set de descriptores + `fd_max` por un mapa dinámico
//! `Token → ActiveConnection`. El conjunto es el único dueño de cada socket:
//! una conexión se saca del mapa y se desregistra antes de cerrarse.

use mio::net::TcpStream;
use mio::{Interest, Registry, Token};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

/// Primer token disponible para conexiones (0 y 1 los usan listener y waker)
pub const FIRST_CONNECTION_TOKEN: usize = 2;

/// Motivo por el que se cerró una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// El peer cerró su lado de escritura (read devolvió 0)
    PeerClosed,

    /// Falló la lectura
    ReadFailed,

    /// Falló la escritura de la respuesta
    WriteFailed,

    /// Solo se pudo escribir una parte de la respuesta
    TruncatedWrite,

    /// Se respondió y la política pide cerrar
    Served,

    /// No se pudo registrar (o re-registrar) el socket en el poller
    RegistrationFailed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CloseReason::PeerClosed => "peer hung up",
            CloseReason::ReadFailed => "read failed",
            CloseReason::WriteFailed => "write failed",
            CloseReason::TruncatedWrite => "truncated write",
            CloseReason::Served => "served",
            CloseReason::RegistrationFailed => "registration failed",
        };
        f.write_str(text)
    }
}

/// Una conexión aceptada desde el endpoint
#[derive(Debug)]
pub struct ActiveConnection {
    stream: TcpStream,
    peer: SocketAddr,
    exchanges: u64,
}

impl ActiveConnection {
    fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            exchanges: 0,
        }
    }

    /// Una sola lectura acotada al tamaño de `buffer`
    pub fn read_once(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buffer)
    }

    /// Una sola escritura; puede escribir menos de `payload.len()`
    pub fn write_once(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.stream.write(payload)
    }

    pub(crate) fn record_exchange(&mut self) {
        self.exchanges += 1;
    }

    /// Dirección del peer (solo informativa)
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Intercambios request/response completados en esta conexión
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }
}

/// Conexiones activas monitoreadas por el poller
#[derive(Debug)]
pub struct ConnectionSet {
    connections: HashMap<Token, ActiveConnection>,
    next_token: usize,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_token: FIRST_CONNECTION_TOKEN,
        }
    }

    /// Registra la conexión para lectura y la agrega al conjunto
    ///
    /// Si el registro falla el stream se descarta (y se cierra) aquí mismo.
    pub fn insert(
        &mut self,
        registry: &Registry,
        mut stream: TcpStream,
        peer: SocketAddr,
    ) -> io::Result<Token> {
        let token = Token(self.next_token);
        registry.register(&mut stream, token, Interest::READABLE)?;
        self.next_token += 1;
        self.connections.insert(token, ActiveConnection::new(stream, peer));
        Ok(token)
    }

    /// Vuelve a pedir notificaciones para la conexión
    ///
    /// Con un poller edge-triggered esto hace que, si quedó algo pendiente
    /// (datos sin leer o EOF), la conexión aparezca lista en la próxima espera.
    pub fn rearm(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        match self.connections.get_mut(&token) {
            Some(connection) => {
                registry.reregister(&mut connection.stream, token, Interest::READABLE)
            }
            None => Ok(()),
        }
    }

    /// Saca la conexión del conjunto y la desregistra
    ///
    /// El socket se cierra cuando el llamador suelta el valor devuelto.
    pub fn remove(&mut self, registry: &Registry, token: Token) -> Option<ActiveConnection> {
        let mut connection = self.connections.remove(&token)?;
        // Si falla, el cierre del descriptor lo saca del poller igual
        let _ = registry.deregister(&mut connection.stream);
        Some(connection)
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut ActiveConnection> {
        self.connections.get_mut(&token)
    }

    pub fn get(&self, token: Token) -> Option<&ActiveConnection> {
        self.connections.get(&token)
    }

    pub fn contains(&self, token: Token) -> bool {
        self.connections.contains_key(&token)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Tokens de las conexiones registradas (sin orden)
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.connections.keys().copied()
    }
}

impl Default for ConnectionSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mio::net::TcpListener;
    use mio::Poll;
    use std::net::TcpStream as StdTcpStream;
    use std::thread;
    use std::time::Duration;

    fn accept_with_retry(listener: &TcpListener) -> (TcpStream, SocketAddr) {
        for _ in 0..100 {
            match listener.accept() {
                Ok(pair) => return pair,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(err) => panic!("accept failed: {}", err),
            }
        }
        panic!("no connection to accept");
    }

    #[test]
    fn test_insert_assigns_increasing_tokens() {
        let poll = Poll::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let mut set = ConnectionSet::new();

        let _a = StdTcpStream::connect(addr).unwrap();
        let _b = StdTcpStream::connect(addr).unwrap();
        let (stream_a, peer_a) = accept_with_retry(&listener);
        let (stream_b, peer_b) = accept_with_retry(&listener);

        let token_a = set.insert(poll.registry(), stream_a, peer_a).unwrap();
        let token_b = set.insert(poll.registry(), stream_b, peer_b).unwrap();

        assert_eq!(token_a, Token(FIRST_CONNECTION_TOKEN));
        assert_eq!(token_b, Token(FIRST_CONNECTION_TOKEN + 1));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(token_b).unwrap().peer(), peer_b);
    }

    #[test]
    fn test_remove_releases_membership() {
        let poll = Poll::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let mut set = ConnectionSet::new();

        let _client = StdTcpStream::connect(addr).unwrap();
        let (stream, peer) = accept_with_retry(&listener);
        let token = set.insert(poll.registry(), stream, peer).unwrap();

        let removed = set.remove(poll.registry(), token).unwrap();
        assert_eq!(removed.peer(), peer);
        assert!(!set.contains(token));
        assert!(set.is_empty());

        // Removing twice is a no-op
        assert!(set.remove(poll.registry(), token).is_none());
    }

    #[test]
    fn test_tokens_not_reused_after_remove() {
        let poll = Poll::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let mut set = ConnectionSet::new();

        let _a = StdTcpStream::connect(addr).unwrap();
        let (stream, peer) = accept_with_retry(&listener);
        let first = set.insert(poll.registry(), stream, peer).unwrap();
        set.remove(poll.registry(), first);

        let _b = StdTcpStream::connect(addr).unwrap();
        let (stream, peer) = accept_with_retry(&listener);
        let second = set.insert(poll.registry(), stream, peer).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_rearm_unknown_token_is_ok() {
        let poll = Poll::new().unwrap();
        let mut set = ConnectionSet::new();
        assert!(set.rearm(poll.registry(), Token(42)).is_ok());
    }

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::PeerClosed.to_string(), "peer hung up");
        assert_eq!(CloseReason::TruncatedWrite.to_string(), "truncated write");
    }
}
