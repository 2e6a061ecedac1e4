//! Tipos de evento del flujo y estructura `FlowEvent`.
//!
//! Rol en el flujo:
//! - Cada transición observable de un flujo (arranque, suspensión,
//!   reanudación, terminación) se registra en un `EventStore` append-only.
//! - Los eventos son el registro diagnóstico del motor: permiten
//!   reconstruir la secuencia de vistas servidas y verificar la fidelidad
//!   de reanudación sin tocar el estado vivo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transiciones observables de un flujo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FlowEventKind {
    /// Arranque de un flujo nuevo. Invariante: debe ser el primer evento de
    /// un `flow_id`.
    FlowStarted { script: String },
    /// El script entregó una vista (o ninguna) y quedó aparcado esperando
    /// la siguiente petición. `step` es el contador monótono de pasos.
    FlowSuspended { step: u64, view_name: Option<String> },
    /// Una petición entrante despertó la ejecución aparcada.
    FlowResumed { step: u64 },
    /// El script terminó sin más suspensiones. El fingerprint agrega la
    /// secuencia ordenada de vistas servidas.
    FlowCompleted { flow_fingerprint: String },
    /// El script terminó con error terminal.
    FlowFailed { error: String },
    /// Expiración por inactividad o expulsión por capacidad.
    FlowExpired,
    /// Abandono explícito vía `terminate`.
    FlowAbandoned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEvent {
    pub seq: u64, // asignado por el EventStore (orden append)
    pub flow_id: Uuid,
    pub kind: FlowEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en el fingerprint)
}
