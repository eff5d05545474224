//! # Mux Server
//! src/lib.rs
//!
//! Servidor TCP de un solo hilo que atiende muchas conexiones a la vez
//! usando notificación de disponibilidad (epoll/kqueue vía `mio`).
//! Sirve para demostrar conceptos de sistemas operativos: sockets,
//! descriptores, multiplexación de E/S y ciclo de vida de conexiones.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `config`: Configuración por CLI y variables de entorno
//! - `error`: Errores fatales del servidor
//! - `http`: Construcción de la respuesta fija (no se parsean requests)
//! - `server`: Endpoint de escucha, conjunto de conexiones y bucle de eventos
//! - `metrics`: Contadores del ciclo de vida de las conexiones
//! - `client`: Cliente bloqueante que envía un único request
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use mux_server::config::Config;
//! use mux_server::server::{ListeningEndpoint, Multiplexer, MultiplexerOptions};
//!
//! let config = Config::default();
//! let endpoint = ListeningEndpoint::start(config.host, config.port, config.backlog)
//!     .expect("Error al iniciar servidor");
//! let mut server = Multiplexer::new(endpoint, MultiplexerOptions::from(&config))
//!     .expect("Error al crear el bucle de eventos");
//! server.run().expect("Error fatal en el bucle de eventos");
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod server;

pub use error::{ServerError, ServerResult};
