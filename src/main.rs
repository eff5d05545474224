//! # Mux Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor: configuración → logging → endpoint →
//! bucle de eventos (o modo iterativo).

use mux_server::config::{Config, ServeMode};
use mux_server::error::{ServerError, ServerResult};
use mux_server::http::Response;
use mux_server::server::{self, iterative, ListeningEndpoint, Multiplexer, MultiplexerOptions};
use tracing::error;

fn main() {
    println!("=================================");
    println!("  Mux Server");
    println!("  Principios de Sistemas Operativos");
    println!("=================================\n");

    // Crear configuración (CLI o variables de entorno)
    let config = Config::new();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false)
        .init();

    if let Err(e) = start(config) {
        error!(error = %e, "Error fatal");
        eprintln!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }
}

fn start(config: Config) -> ServerResult<()> {
    config.validate().map_err(ServerError::Config)?;
    config.print_summary();

    let endpoint = ListeningEndpoint::start(config.host, config.port, config.backlog)?;

    match config.mode {
        ServeMode::Multiplexed => {
            let mut multiplexer = Multiplexer::new(endpoint, MultiplexerOptions::from(&config))?;
            server::install_interrupt_handler(multiplexer.shutdown_handle())?;
            // Esto bloquea el thread hasta Ctrl+C
            multiplexer.run()
        }
        ServeMode::Iterative => {
            server::install_exit_handler()?;
            iterative::serve_forever(
                endpoint.into_listener(),
                config.buffer_size,
                &Response::canned(&config.body),
            )
        }
    }
}
