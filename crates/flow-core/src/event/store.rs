use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use super::{FlowEvent, FlowEventKind};

/// Almacenamiento de eventos append-only.
///
/// A diferencia de un log secuencial clásico, aquí conviven flujos
/// concurrentes: `append_kind` y `list` deben poder llamarse desde
/// distintos flujos sin corromperse (de ahí `&self` + mutabilidad
/// interior en las implementaciones).
pub trait EventStore: Send + Sync {
    /// Agrega un evento a partir de su kind y devuelve el evento completo
    /// (con seq y ts).
    fn append_kind(&self, flow_id: Uuid, kind: FlowEventKind) -> FlowEvent;
    /// Lista eventos de un flujo (orden ascendente por seq).
    fn list(&self, flow_id: Uuid) -> Vec<FlowEvent>;
}

#[derive(Default)]
pub struct InMemoryEventStore {
    inner: RwLock<HashMap<Uuid, Vec<FlowEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&self, flow_id: Uuid, kind: FlowEventKind) -> FlowEvent {
        let mut guard = self.inner.write().expect("event store lock poisoned");
        let vec = guard.entry(flow_id).or_default();
        let seq = vec.len() as u64;
        let ev = FlowEvent { seq,
                             flow_id,
                             kind,
                             ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, flow_id: Uuid) -> Vec<FlowEvent> {
        self.inner
            .read()
            .expect("event store lock poisoned")
            .get(&flow_id)
            .cloned()
            .unwrap_or_default()
    }
}
