//! # Multiplexor de Conexiones
//! src/server/multiplexer.rs
//!
//! Un solo hilo atiende todas las conexiones:
//!
//! ```text
//! espera (sin timeout) → por cada socket listo:
//!     listener  → accept + registrar
//!     conexión  → read acotado → 0: cerrar | error: cerrar | n: responder
//! → repetir
//! ```
//!
//! La espera de eventos es el único punto donde el hilo se bloquea. Todos
//! los sockets son no bloqueantes, así que accept/read/write sobre un socket
//! listo vuelven de inmediato.
//!
//! `mio` usa notificación edge-triggered. Para conservar la semántica de
//! "un read por iteración" de un poller level-triggered, después de
//! responder se vuelve a registrar la conexión si el read llenó el buffer o
//! si el peer ya colgó: así la próxima espera la reporta lista otra vez y
//! el resto de los datos (o el EOF) se atiende en la siguiente iteración.

use super::connection::{CloseReason, ConnectionSet};
use super::endpoint::ListeningEndpoint;
use super::shutdown::ShutdownHandle;
use crate::config::{Config, ConnectionPolicy};
use crate::error::{ServerError, ServerResult};
use crate::http::Response;
use crate::metrics::ConnectionStats;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use std::collections::HashSet;
use std::io;
use std::mem;
use std::net::SocketAddrV4;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);

/// Parámetros del multiplexor
#[derive(Debug, Clone)]
pub struct MultiplexerOptions {
    /// Tamaño del único read por evento; lo que sobra se lee en la siguiente iteración
    pub buffer_size: usize,

    /// Eventos que se recogen por espera
    pub events_capacity: usize,

    pub policy: ConnectionPolicy,

    /// Respuesta fija que se envía por cada read con datos
    pub response: Response,
}

impl Default for MultiplexerOptions {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            events_capacity: 1024,
            policy: ConnectionPolicy::KeepOpen,
            response: Response::default(),
        }
    }
}

impl From<&Config> for MultiplexerOptions {
    fn from(config: &Config) -> Self {
        Self {
            buffer_size: config.buffer_size,
            events_capacity: config.events_capacity,
            policy: config.policy,
            response: Response::canned(&config.body),
        }
    }
}

/// Resultado de una iteración del bucle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Continue,

    /// Se pidió apagar; la iteración ya terminó de atender a todos los listos
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
struct Readiness {
    token: Token,
    hang_up: bool,
}

/// Servidor de un solo hilo dirigido por eventos de disponibilidad
pub struct Multiplexer {
    poll: Poll,
    events: Events,
    /// Tokens listos de la iteración en curso (se reutiliza entre iteraciones)
    ready: Vec<Readiness>,
    listener: TcpListener,
    local_addr: SocketAddrV4,
    connections: ConnectionSet,
    shutdown: ShutdownHandle,
    buffer: Vec<u8>,
    response: Vec<u8>,
    policy: ConnectionPolicy,
    stats: ConnectionStats,
    /// Tokens aceptados o re-registrados en la iteración en curso
    fresh: HashSet<Token>,
    /// Tokens que se atienden recién en la próxima espera
    deferred: Vec<Token>,
}

impl Multiplexer {
    /// Toma el endpoint y lo registra en un poller nuevo
    pub fn new(endpoint: ListeningEndpoint, options: MultiplexerOptions) -> ServerResult<Self> {
        let local_addr = endpoint.local_addr();
        let std_listener = endpoint.into_listener();
        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Socket)?;
        let mut listener = TcpListener::from_std(std_listener);

        let poll = Poll::new().map_err(ServerError::Poll)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(ServerError::Poll)?;
        let waker = Waker::new(poll.registry(), WAKER).map_err(ServerError::Poll)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(options.events_capacity.max(1)),
            ready: Vec::new(),
            listener,
            local_addr,
            connections: ConnectionSet::new(),
            shutdown: ShutdownHandle::new(Arc::new(waker)),
            buffer: vec![0; options.buffer_size.max(1)],
            response: options.response.to_bytes(),
            policy: options.policy,
            stats: ConnectionStats::new(),
            fresh: HashSet::new(),
            deferred: Vec::new(),
        })
    }

    /// Corre el bucle de eventos hasta que se pida apagar
    ///
    /// Sin un [`ShutdownHandle`] disparado no retorna nunca. Solo un fallo de
    /// la espera de eventos termina el bucle con error.
    pub fn run(&mut self) -> ServerResult<()> {
        info!(
            address = %self.local_addr,
            policy = ?self.policy,
            buffer = self.buffer.len(),
            "Multiplexor iniciado"
        );

        loop {
            match self.turn(None) {
                Ok(Turn::Continue) => {}
                Ok(Turn::Shutdown) => {
                    let stats = self.stats.snapshot();
                    info!(
                        accepted = stats.accepted,
                        responses = stats.responses_sent,
                        closed = stats.closed,
                        still_open = self.connections.len(),
                        peak = stats.peak_connections,
                        "Servidor detenido"
                    );
                    return Ok(());
                }
                Err(e) => {
                    error!(error = %e, "Fallo fatal en la espera de eventos");
                    return Err(e);
                }
            }
        }
    }

    /// Una iteración: esperar y atender a todos los sockets listos
    ///
    /// `run` la llama con `timeout = None`. Si la espera llenó el buffer de
    /// eventos, se vuelve a consultar sin bloquear hasta que una cosecha
    /// quede corta, así ningún socket listo queda para la próxima espera
    /// aunque haya más listos que `events_capacity`.
    ///
    /// Las conexiones aceptadas o re-registradas en esta iteración recién se
    /// atienden a partir de la siguiente espera.
    pub fn turn(&mut self, timeout: Option<Duration>) -> ServerResult<Turn> {
        let mut timeout = timeout;
        let mut follow_up = false;
        let mut turn = Turn::Continue;
        self.fresh.clear();

        loop {
            if let Err(e) = self.poll.poll(&mut self.events, timeout) {
                if e.kind() == io::ErrorKind::Interrupted {
                    break;
                }
                return Err(ServerError::Poll(e));
            }

            let mut ready = mem::take(&mut self.ready);
            ready.clear();
            ready.extend(self.events.iter().map(|event| Readiness {
                token: event.token(),
                hang_up: event.is_read_closed() || event.is_error(),
            }));
            let harvest_full = ready.len() >= self.events.capacity();

            for readiness in &ready {
                match readiness.token {
                    LISTENER => self.accept_pending(),
                    WAKER => turn = Turn::Shutdown,
                    token if follow_up && self.fresh.contains(&token) => {
                        self.deferred.push(token);
                    }
                    token => self.service(token, readiness.hang_up),
                }
            }
            self.ready = ready;

            if !harvest_full {
                break;
            }
            trace!(
                capacity = self.events.capacity(),
                "Buffer de eventos lleno, cosechando otra vez"
            );
            timeout = Some(Duration::ZERO);
            follow_up = true;
        }

        // Lo que se postergó tiene que volver a aparecer en la próxima espera
        for token in mem::take(&mut self.deferred) {
            self.rearm(token);
        }

        Ok(turn)
    }

    /// Acepta todas las conexiones pendientes en el backlog
    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    match self.connections.insert(self.poll.registry(), stream, peer) {
                        Ok(token) => {
                            self.fresh.insert(token);
                            self.stats.record_accept(self.connections.len());
                            info!(
                                token = token.0,
                                %peer,
                                active = self.connections.len(),
                                "Nueva conexión"
                            );
                        }
                        Err(e) => {
                            self.stats.record_accept_failure();
                            warn!(%peer, error = %e, "No se pudo registrar la conexión");
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::ConnectionAborted => {
                    self.stats.record_accept_failure();
                    warn!(error = %e, "El peer abortó antes del accept");
                }
                Err(e) => {
                    // p.ej. EMFILE: lo pendiente se reintenta en la próxima espera
                    self.stats.record_accept_failure();
                    warn!(error = %e, "Error al aceptar conexión");
                    if let Err(e) = self.poll.registry().reregister(
                        &mut self.listener,
                        LISTENER,
                        Interest::READABLE,
                    ) {
                        error!(error = %e, "No se pudo re-registrar el listener");
                    }
                    break;
                }
            }
        }
    }

    /// Atiende una conexión lista: un read acotado y, si hubo datos, una respuesta
    fn service(&mut self, token: Token, hang_up: bool) {
        let Some(connection) = self.connections.get_mut(token) else {
            trace!(token = token.0, "Evento para una conexión que ya no existe");
            return;
        };
        let peer = connection.peer();

        let received = match connection.read_once(&mut self.buffer) {
            Ok(0) => {
                self.close(token, CloseReason::PeerClosed);
                return;
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                self.rearm(token);
                return;
            }
            Err(e) => {
                warn!(token = token.0, %peer, error = %e, "No se pudo leer del socket");
                self.close(token, CloseReason::ReadFailed);
                return;
            }
        };

        self.stats.record_received(received);
        debug!(
            token = token.0,
            %peer,
            bytes = received,
            payload = %String::from_utf8_lossy(&self.buffer[..received]),
            "Mensaje recibido"
        );

        match connection.write_once(&self.response) {
            Ok(written) if written == self.response.len() => {}
            Ok(written) => {
                warn!(
                    token = token.0,
                    %peer,
                    written,
                    expected = self.response.len(),
                    "Respuesta escrita a medias"
                );
                self.close(token, CloseReason::TruncatedWrite);
                return;
            }
            Err(e) => {
                warn!(token = token.0, %peer, error = %e, "No se pudo enviar la respuesta");
                self.close(token, CloseReason::WriteFailed);
                return;
            }
        }

        connection.record_exchange();
        self.stats.record_response();
        debug!(token = token.0, %peer, bytes = self.response.len(), "Respuesta enviada");

        match self.policy {
            ConnectionPolicy::CloseAfterResponse => self.close(token, CloseReason::Served),
            ConnectionPolicy::KeepOpen => {
                if hang_up || received == self.buffer.len() {
                    self.rearm(token);
                }
            }
        }
    }

    fn rearm(&mut self, token: Token) {
        self.fresh.insert(token);
        if let Err(e) = self.connections.rearm(self.poll.registry(), token) {
            warn!(token = token.0, error = %e, "No se pudo re-registrar la conexión");
            self.close(token, CloseReason::RegistrationFailed);
        }
    }

    /// Saca la conexión del conjunto y suelta el socket
    fn close(&mut self, token: Token, reason: CloseReason) {
        if let Some(connection) = self.connections.remove(self.poll.registry(), token) {
            self.stats.record_close(reason);
            info!(
                token = token.0,
                peer = %connection.peer(),
                exchanges = connection.exchanges(),
                %reason,
                active = self.connections.len(),
                "Conexión cerrada"
            );
        }
    }

    /// Dirección real del endpoint
    pub fn local_addr(&self) -> SocketAddrV4 {
        self.local_addr
    }

    /// Manejador para detener `run` desde otro hilo o desde un manejador de señales
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    pub fn policy(&self) -> ConnectionPolicy {
        self.policy
    }
}
