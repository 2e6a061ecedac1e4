//! Estado observable de un contexto de flujo.

use serde::{Deserialize, Serialize};

/// Ciclo de vida de un flujo. Las transiciones válidas son
/// Running → Suspended → Running (reanudación) y cualquiera → Terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    Running,
    Suspended,
    Terminated,
}
