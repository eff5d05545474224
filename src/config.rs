//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor con soporte completo
//! para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./mux_server --port 8080 \
//!   --backlog 10 \
//!   --buffer-size 1024 \
//!   --connection-policy close-after-response
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! MUX_PORT=8080 MUX_HOST=0.0.0.0 MUX_LOG=debug ./mux_server
//! ```

use clap::{Parser, ValueEnum};
use std::net::{Ipv4Addr, SocketAddrV4};
use tracing::Level;

/// Qué hacer con una conexión después de responderle
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConnectionPolicy {
    /// La conexión sigue registrada hasta que el peer la cierre (EOF) o falle
    KeepOpen,

    /// Se cierra inmediatamente después de un intercambio request/response
    CloseAfterResponse,
}

/// Estrategia con la que se atienden las conexiones
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServeMode {
    /// Un solo hilo con espera de disponibilidad sobre todas las conexiones
    Multiplexed,

    /// Una conexión a la vez: accept, leer, responder, cerrar
    Iterative,
}

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "mux_server")]
#[command(about = "Servidor TCP de un solo hilo que multiplexa conexiones")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "MUX_PORT")]
    pub port: u16,

    /// Dirección IPv4 en la que escucha (0.0.0.0 = todas las interfaces)
    #[arg(long, default_value = "0.0.0.0", env = "MUX_HOST")]
    pub host: Ipv4Addr,

    /// Máximo de conexiones establecidas pendientes de aceptar
    #[arg(long, default_value = "10", env = "MUX_BACKLOG")]
    pub backlog: u32,

    // === Conexiones ===

    /// Tamaño del buffer de lectura (un request más grande se trunca)
    #[arg(long = "buffer-size", default_value = "1024", env = "MUX_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Máximo de eventos que se recogen en cada espera
    #[arg(long = "events-capacity", default_value = "1024", env = "MUX_EVENTS_CAPACITY")]
    pub events_capacity: usize,

    /// Política de cierre después de responder
    #[arg(
        long = "connection-policy",
        value_enum,
        default_value = "keep-open",
        env = "MUX_CONNECTION_POLICY"
    )]
    pub policy: ConnectionPolicy,

    /// Modo de atención de conexiones
    #[arg(long, value_enum, default_value = "multiplexed", env = "MUX_MODE")]
    pub mode: ServeMode,

    // === Respuesta ===

    /// Body de la respuesta fija
    #[arg(long, default_value = "Hello from server!", env = "MUX_RESPONSE_BODY")]
    pub body: String,

    // === Logging ===

    /// Nivel máximo de log (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "info", env = "MUX_LOG")]
    pub log_level: Level,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use mux_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address().to_string(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.backlog == 0 {
            return Err("Backlog must be >= 1".to_string());
        }
        if self.backlog > i32::MAX as u32 {
            return Err(format!("Backlog must be <= {}", i32::MAX));
        }
        if self.buffer_size == 0 {
            return Err("Buffer size must be >= 1".to_string());
        }
        if self.events_capacity == 0 {
            return Err("Events capacity must be >= 1".to_string());
        }
        if self.body.is_empty() {
            return Err("Response body must not be empty".to_string());
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║               Mux Server Configuration                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Backlog:      {}", self.backlog);
        println!("   Mode:         {:?}", self.mode);
        println!();
        println!("🔌 Connections:");
        println!("   Buffer:       {} bytes", self.buffer_size);
        println!("   Events/wait:  {}", self.events_capacity);
        println!("   Policy:       {:?}", self.policy);
        println!();
        println!("📝 Response body: {} bytes", self.body.len());
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: Ipv4Addr::UNSPECIFIED,
            backlog: 10,
            buffer_size: 1024,
            events_capacity: 1024,
            policy: ConnectionPolicy::KeepOpen,
            mode: ServeMode::Multiplexed,
            body: "Hello from server!".to_string(),
            log_level: Level::INFO,
        }
    }
}
