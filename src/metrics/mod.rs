//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Contadores del ciclo de vida de las conexiones que mantiene el bucle de
//! eventos:
//! - Conexiones aceptadas y fallos de accept
//! - Respuestas enviadas y bytes recibidos
//! - Cierres agrupados por motivo
//! - Pico de conexiones simultáneas

pub mod collector;

pub use collector::{ConnectionStats, StatsSnapshot};
