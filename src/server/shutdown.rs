//! # Apagado del Servidor
//! src/server/shutdown.rs
//!
//! En vez de guardar el descriptor del socket en una variable global para
//! que la use el manejador de SIGINT, el manejador captura un
//! [`ShutdownHandle`]: un waker registrado en el poller del multiplexor.
//! Al dispararlo, la espera de eventos vuelve, se termina de atender la
//! iteración en curso y `run` retorna, cerrando el socket de escucha.

use crate::error::ServerResult;
use mio::Waker;
use std::io;
use std::sync::Arc;
use tracing::{error, info};

/// Manejador para pedirle al multiplexor que se detenga
///
/// Se puede clonar y mandar a otros hilos.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    pub(crate) fn new(waker: Arc<Waker>) -> Self {
        Self { waker }
    }

    /// Despierta al bucle de eventos con un pedido de apagado
    pub fn trigger(&self) -> io::Result<()> {
        self.waker.wake()
    }
}

/// Conecta Ctrl+C (SIGINT) y SIGTERM con el apagado del multiplexor
///
/// Solo puede haber un manejador por proceso.
pub fn install_interrupt_handler(handle: ShutdownHandle) -> ServerResult<()> {
    ctrlc::set_handler(move || {
        info!("Señal recibida, apagando");
        if let Err(e) = handle.trigger() {
            error!(error = %e, "No se pudo despertar al bucle de eventos");
            std::process::exit(1);
        }
    })?;
    Ok(())
}

/// Manejador para el modo iterativo: no hay bucle que despertar
///
/// El proceso termina con código 0 y el sistema cierra el socket de escucha.
pub fn install_exit_handler() -> ServerResult<()> {
    ctrlc::set_handler(|| {
        info!("Señal recibida, apagando");
        std::process::exit(0);
    })?;
    Ok(())
}
