//! # Errores del Servidor
//! src/error.rs
//!
//! Solo los errores fatales llegan hasta aquí: crear el endpoint de escucha
//! o que falle la espera de eventos. Los errores de cada conexión se
//! registran en el log y nunca salen del bucle de eventos.

use std::io;
use std::net::SocketAddrV4;
use thiserror::Error;

/// Errores fatales del servidor
#[derive(Error, Debug)]
pub enum ServerError {
    /// No se pudo crear o configurar el socket
    #[error("Failed to create socket: {0}")]
    Socket(#[source] io::Error),

    /// La dirección/puerto no está disponible
    #[error("Failed to bind socket to {addr}: {source}")]
    Bind {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    /// No se pudo establecer el backlog
    #[error("Failed to listen on socket with backlog {backlog}: {source}")]
    Listen {
        backlog: u32,
        #[source]
        source: io::Error,
    },

    /// Falló la primitiva de espera de disponibilidad
    #[error("Failed to wait for socket readiness: {0}")]
    Poll(#[source] io::Error),

    /// No se pudo instalar el manejador de Ctrl+C
    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// Configuración inválida
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Resultado de las operaciones fatales del servidor
pub type ServerResult<T> = Result<T, ServerError>;
