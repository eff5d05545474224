//! # Endpoint de Escucha
//! src/server/endpoint.rs
//!
//! `std::net::TcpListener::bind` no deja elegir el backlog, así que el socket
//! se crea a mano con `libc`: `socket` → `setsockopt` → `bind` → `listen`.
//! Cada paso tiene su propio error para distinguir "puerto ocupado" de
//! "backlog inválido".

use crate::error::{ServerError, ServerResult};
use std::io;
use std::mem;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use tracing::info;

macro_rules! syscall {
    ($func_name: ident ( $($arg: expr),* $(,)* ) ) => {
        {
            let result = unsafe { libc::$func_name($($arg,)* ) };
            if result == -1 { Err(io::Error::last_os_error()) } else { Ok(result) }
        }
    }
}

// Igual que los sockets de std: el descriptor no se hereda en un exec
#[cfg(any(target_os = "linux", target_os = "android"))]
const SOCKET_TYPE: libc::c_int = libc::SOCK_STREAM | libc::SOCK_CLOEXEC;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SOCKET_TYPE: libc::c_int = libc::SOCK_STREAM;

/// Socket TCP/IPv4 enlazado y en estado de escucha
///
/// Se crea una sola vez al arrancar y no cambia después.
#[derive(Debug)]
pub struct ListeningEndpoint {
    listener: TcpListener,
    local_addr: SocketAddrV4,
    backlog: u32,
}

impl ListeningEndpoint {
    /// Crea el socket, lo enlaza a `bind_address:port` y empieza a escuchar
    ///
    /// El puerto 0 le pide al sistema operativo un puerto libre; el puerto
    /// real queda en [`local_addr`](Self::local_addr).
    ///
    /// # Errores
    ///
    /// - [`ServerError::Socket`] si no se pudo crear el socket
    /// - [`ServerError::Bind`] si la dirección/puerto no está disponible
    /// - [`ServerError::Listen`] si no se pudo establecer el backlog
    pub fn start(bind_address: Ipv4Addr, port: u16, backlog: u32) -> ServerResult<Self> {
        let requested = SocketAddrV4::new(bind_address, port);

        let fd = syscall!(socket(libc::AF_INET, SOCKET_TYPE, 0)).map_err(ServerError::Socket)?;
        // A partir de aquí el descriptor se cierra solo en cualquier `?`
        let socket = unsafe { OwnedFd::from_raw_fd(fd) };
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            syscall!(fcntl(socket.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC))
                .map_err(ServerError::Socket)?;
        }

        let reuse: libc::c_int = 1;
        syscall!(setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &reuse as *const libc::c_int as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        ))
        .map_err(ServerError::Socket)?;

        let address = sockaddr_in(requested);
        syscall!(bind(
            socket.as_raw_fd(),
            &address as *const libc::sockaddr_in as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        ))
        .map_err(|source| ServerError::Bind {
            addr: requested,
            source,
        })?;

        let raw_backlog = libc::c_int::try_from(backlog).map_err(|_| ServerError::Listen {
            backlog,
            source: io::Error::new(io::ErrorKind::InvalidInput, "backlog out of range"),
        })?;
        syscall!(listen(socket.as_raw_fd(), raw_backlog))
            .map_err(|source| ServerError::Listen { backlog, source })?;

        let listener = TcpListener::from(socket);
        let local_addr = match listener.local_addr().map_err(ServerError::Socket)? {
            SocketAddr::V4(addr) => addr,
            SocketAddr::V6(_) => requested,
        };

        info!(address = %local_addr, backlog, "Servidor escuchando");

        Ok(Self {
            listener,
            local_addr,
            backlog,
        })
    }

    /// Dirección local real (incluye el puerto asignado si se pidió el 0)
    pub fn local_addr(&self) -> SocketAddrV4 {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn backlog(&self) -> u32 {
        self.backlog
    }

    /// Entrega el listener bloqueante para que lo use un bucle de servicio
    pub fn into_listener(self) -> TcpListener {
        self.listener
    }
}

fn sockaddr_in(address: SocketAddrV4) -> libc::sockaddr_in {
    // sockaddr_in tiene campos distintos según la plataforma (sin_len en BSD)
    let mut raw: libc::sockaddr_in = unsafe { mem::zeroed() };
    raw.sin_family = libc::AF_INET as libc::sa_family_t;
    raw.sin_port = address.port().to_be();
    raw.sin_addr = libc::in_addr {
        s_addr: u32::from(*address.ip()).to_be(),
    };
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;

    #[test]
    fn test_start_on_ephemeral_port() {
        let endpoint = ListeningEndpoint::start(Ipv4Addr::LOCALHOST, 0, 10).unwrap();

        assert_ne!(endpoint.port(), 0);
        assert_eq!(*endpoint.local_addr().ip(), Ipv4Addr::LOCALHOST);
        assert_eq!(endpoint.backlog(), 10);
    }

    #[test]
    fn test_endpoint_accepts_connections() {
        let endpoint = ListeningEndpoint::start(Ipv4Addr::LOCALHOST, 0, 4).unwrap();
        let addr = endpoint.local_addr();
        let listener = endpoint.into_listener();

        let client = TcpStream::connect(addr).unwrap();
        let (_stream, peer) = listener.accept().unwrap();

        assert_eq!(peer, client.local_addr().unwrap());
    }

    #[test]
    fn test_bind_error_when_port_taken() {
        let first = ListeningEndpoint::start(Ipv4Addr::LOCALHOST, 0, 4).unwrap();
        let port = first.port();

        let second = ListeningEndpoint::start(Ipv4Addr::LOCALHOST, port, 4);

        match second {
            Err(ServerError::Bind { addr, source }) => {
                assert_eq!(addr.port(), port);
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
            }
            other => panic!("expected bind error, got {:?}", other),
        }
    }

    #[test]
    fn test_listen_error_when_backlog_out_of_range() {
        let result = ListeningEndpoint::start(Ipv4Addr::LOCALHOST, 0, u32::MAX);
        assert!(matches!(result, Err(ServerError::Listen { backlog: u32::MAX, .. })));
    }

    #[test]
    fn test_listening_socket_is_close_on_exec() {
        let listener = ListeningEndpoint::start(Ipv4Addr::LOCALHOST, 0, 4)
            .unwrap()
            .into_listener();

        let flags = unsafe { libc::fcntl(listener.as_raw_fd(), libc::F_GETFD) };
        assert!(flags >= 0);
        assert_ne!(flags & libc::FD_CLOEXEC, 0);
    }

    #[test]
    fn test_sockaddr_in_network_order() {
        let raw = sockaddr_in(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 8080));
        assert_eq!(u16::from_be(raw.sin_port), 8080);
        assert_eq!(u32::from_be(raw.sin_addr.s_addr), 0x7f00_0001);
    }
}
