//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! El multiplexor corre en un solo hilo, así que los contadores viven
//! directamente dentro de él: no hace falta `Arc<Mutex<_>>`.

use crate::server::CloseReason;
use std::collections::HashMap;
use std::time::Instant;

/// Contadores del ciclo de vida de las conexiones
#[derive(Debug, Clone)]
pub struct ConnectionStats {
    start_time: Instant,

    /// Conexiones aceptadas desde el endpoint
    accepted: u64,

    /// Accepts que fallaron (no fatales)
    accept_failures: u64,

    /// Respuestas enviadas completas
    responses_sent: u64,

    /// Bytes leídos de todos los peers
    bytes_received: u64,

    /// Cierres por motivo
    closes: HashMap<CloseReason, u64>,

    /// Máximo de conexiones registradas a la vez
    peak_connections: usize,
}

impl ConnectionStats {
    /// Crea un collector vacío
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            accepted: 0,
            accept_failures: 0,
            responses_sent: 0,
            bytes_received: 0,
            closes: HashMap::new(),
            peak_connections: 0,
        }
    }

    /// Registra un accept exitoso; `active` es el tamaño del conjunto después de registrar
    pub fn record_accept(&mut self, active: usize) {
        self.accepted += 1;
        self.peak_connections = self.peak_connections.max(active);
    }

    pub fn record_accept_failure(&mut self) {
        self.accept_failures += 1;
    }

    /// Registra bytes leídos de un peer
    pub fn record_received(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
    }

    pub fn record_response(&mut self) {
        self.responses_sent += 1;
    }

    /// Registra el cierre de una conexión
    pub fn record_close(&mut self, reason: CloseReason) {
        *self.closes.entry(reason).or_insert(0) += 1;
    }

    /// Cantidad de cierres por un motivo dado
    pub fn closes(&self, reason: CloseReason) -> u64 {
        self.closes.get(&reason).copied().unwrap_or(0)
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            accepted: self.accepted,
            accept_failures: self.accept_failures,
            responses_sent: self.responses_sent,
            bytes_received: self.bytes_received,
            closed: self.closes.values().sum(),
            peak_connections: self.peak_connections,
        }
    }
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot de métricas (para uso externo)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub accepted: u64,
    pub accept_failures: u64,
    pub responses_sent: u64,
    pub bytes_received: u64,
    pub closed: u64,
    pub peak_connections: usize,
}
