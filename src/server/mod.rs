//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Crea el endpoint de escucha con un backlog explícito
//! 2. Espera a que algún socket esté listo (sin bloquearse en ninguno)
//! 3. Acepta conexiones nuevas y las agrega al conjunto monitoreado
//! 4. Lee de cada conexión lista y le envía la respuesta fija
//! 5. Saca del conjunto a las conexiones cerradas o con error
//!
//! También incluye la variante iterativa (una conexión a la vez).

pub mod connection;
pub mod endpoint;
pub mod iterative;
pub mod multiplexer;
pub mod shutdown;

// Re-exportar para facilitar el uso
pub use connection::{ActiveConnection, CloseReason, ConnectionSet};
pub use endpoint::ListeningEndpoint;
pub use multiplexer::{Multiplexer, MultiplexerOptions, Turn};
pub use shutdown::{install_exit_handler, install_interrupt_handler, ShutdownHandle};
