//! flow-core: Motor de suspensión/reanudación para flujos web lineales.
//!
//! Un script de flujo se escribe como una ejecución lineal que "bloquea"
//! esperando la siguiente petición del cliente. El motor congela la
//! ejecución en cada `wait()`, entrega la vista pendiente al despachador y
//! reactiva exactamente la misma ejecución (pila, cursores de bucle y
//! variables locales intactos) cuando llega la petición siguiente.
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod scope;
pub mod script;

pub use config::EngineConfig;
pub use engine::{EngineBuilder, FlowEngine, FlowExecutionInterceptor};
pub use errors::{FlowEngineError, ScriptError};
pub use event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use model::{FlowInfo, FlowOutcome, FlowStatus, InputRecord, ViewResponse};
pub use scope::{CleanupGuard, FlowScope};
pub use script::{FlowScript, InMemoryScriptStorage, ScriptStorage};
