//! Builder para `FlowEngine`.
//!
//! Configura stores, parámetros operativos e interceptores antes de
//! construir el motor. Las stores (eventos + scripts) deben estar
//! presentes desde el inicio; el resto es opcional con defaults.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::{FlowEngine, FlowExecutionInterceptor};
use crate::event::EventStore;
use crate::script::ScriptStorage;

pub struct EngineBuilder<E: EventStore, S: ScriptStorage> {
    event_store: E,
    scripts: S,
    config: EngineConfig,
    interceptors: Vec<Arc<dyn FlowExecutionInterceptor>>,
}

impl<E: EventStore + 'static, S: ScriptStorage + 'static> EngineBuilder<E, S> {
    pub(crate) fn new(event_store: E, scripts: S) -> Self {
        Self { event_store,
               scripts,
               config: EngineConfig::default(),
               interceptors: Vec::new() }
    }

    /// Sustituye la configuración por defecto.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Añade un interceptor de ciclo de vida.
    pub fn interceptor(mut self, interceptor: Arc<dyn FlowExecutionInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Construye el motor final. Consume el builder.
    pub fn build(self) -> FlowEngine<E, S> {
        FlowEngine::from_parts(self.event_store, self.scripts, self.config, self.interceptors)
    }
}
