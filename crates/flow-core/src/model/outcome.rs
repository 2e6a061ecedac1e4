//! Resultado de un turno de despacho y diagnóstico de un flujo.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{FlowStatus, ViewResponse};

/// Lo que el despachador devuelve al atender una petición: o bien el flujo
/// quedó suspendido esperando la siguiente entrada, o bien terminó. En
/// ambos casos la vista puede faltar (un script puede suspender o terminar
/// sin haber llamado a `respond`).
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    Suspended { flow_id: Uuid, view: Option<ViewResponse> },
    Completed { flow_id: Uuid, view: Option<ViewResponse> },
}

impl FlowOutcome {
    pub fn flow_id(&self) -> Uuid {
        match self {
            FlowOutcome::Suspended { flow_id, .. } | FlowOutcome::Completed { flow_id, .. } => *flow_id,
        }
    }

    pub fn view(&self) -> Option<&ViewResponse> {
        match self {
            FlowOutcome::Suspended { view, .. } | FlowOutcome::Completed { view, .. } => view.as_ref(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, FlowOutcome::Completed { .. })
    }
}

/// Instantánea diagnóstica de un contexto de flujo.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowInfo {
    pub flow_id: Uuid,
    pub script: String,
    pub status: FlowStatus,
    /// Contador monótono de pasos: cuántas reanudaciones ha atendido.
    pub step: u64,
    /// Última vista servida (para re-render idempotente y diagnóstico).
    pub last_view: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_touched: DateTime<Utc>,
}
