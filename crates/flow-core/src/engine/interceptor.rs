//! Hooks de ciclo de vida alrededor de la ejecución de un flujo.

use uuid::Uuid;

use crate::errors::ScriptError;

/// Interceptor de ejecución: inicialización a medida antes del primer
/// arranque de un flujo y limpieza tras su terminación (normal, fallida,
/// abandonada o expirada). `error` es `Some` solo en terminaciones por
/// fallo del script.
pub trait FlowExecutionInterceptor: Send + Sync {
    fn before_start(&self, _flow_id: Uuid, _script: &str) {}
    fn after_termination(&self, _flow_id: Uuid, _error: Option<&ScriptError>) {}
}
