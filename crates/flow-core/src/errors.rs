//! Errores del motor y de los scripts.
//!
//! Los errores de motor (`FlowEngineError`) nunca son recuperables por el
//! script: se propagan al despachador. Los fallos de validación a nivel de
//! script no son errores, son datos dentro del modelo de la vista.

use thiserror::Error;
use uuid::Uuid;

/// Errores observables por el llamador del despachador.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowEngineError {
    #[error("unknown flow: {0}")] UnknownFlow(Uuid),
    #[error("flow already terminated: {0}")] FlowAlreadyTerminated(Uuid),
    #[error("flow busy: concurrent resume on {0}")] FlowBusy(Uuid),
    #[error("suspend outside of an engine-managed flow")] SuspendOutsideFlow,
    #[error("script error: {0}")] Script(#[from] ScriptError),
    #[error("internal: {0}")] Internal(String),
}

/// Errores que fluyen dentro de la ejecución de un script.
///
/// `Terminated` es la señal de cancelación explícita: llega por el canal de
/// mandos del flujo y se propaga con `?` para desenrollar la pila del
/// script. Los guardas de limpieza la observan como una salida genuina.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("flow terminated while waiting for input")] Terminated,
    #[error("suspend outside of an engine-managed flow")] SuspendOutsideFlow,
    #[error("script not found: {0}")] ScriptNotFound(String),
    #[error("script failed: {0}")] Failed(String),
}
