//! Contexto de flujo: la entrada del registro para una interacción viva.
//!
//! Existe exactamente un `FlowContext` por interacción; es propiedad
//! exclusiva del motor y solo muta a través de las operaciones de
//! suspensión/reanudación. La instantánea de ejecución no vive aquí: es la
//! tarea aparcada al otro lado del canal de mandos.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::FlowEngineError;
use crate::model::{FlowInfo, FlowStatus};
use crate::scope::FlowCommand;

pub(crate) struct FlowContext {
    pub flow_id: Uuid,
    pub script: String,
    /// Extremo del canal de mandos hacia la tarea aparcada.
    pub commands: mpsc::Sender<FlowCommand>,
    status: Mutex<FlowStatus>,
    step: AtomicU64,
    last_view: Mutex<Option<String>>,
    started_at: DateTime<Utc>,
    last_touched: Mutex<DateTime<Utc>>,
}

impl FlowContext {
    pub fn new(flow_id: Uuid, script: impl Into<String>, commands: mpsc::Sender<FlowCommand>) -> Self {
        let now = Utc::now();
        Self { flow_id,
               script: script.into(),
               commands,
               status: Mutex::new(FlowStatus::Running),
               step: AtomicU64::new(0),
               last_view: Mutex::new(None),
               started_at: now,
               last_touched: Mutex::new(now) }
    }

    pub fn status(&self) -> FlowStatus {
        *self.status.lock().expect("flow status lock poisoned")
    }

    pub fn step(&self) -> u64 {
        self.step.load(Ordering::SeqCst)
    }

    pub fn last_touched(&self) -> DateTime<Utc> {
        *self.last_touched.lock().expect("flow touch lock poisoned")
    }

    /// Transición Suspended → Running con exclusión mutua por identidad.
    /// Reanudar un flujo ya en marcha falla rápido con `FlowBusy`; la
    /// segunda petición nunca compite con la ejecución en curso. Devuelve
    /// el nuevo valor del contador de pasos.
    pub fn try_begin_resume(&self) -> Result<u64, FlowEngineError> {
        let mut st = self.status.lock().expect("flow status lock poisoned");
        match *st {
            FlowStatus::Suspended => {
                *st = FlowStatus::Running;
                Ok(self.step.fetch_add(1, Ordering::SeqCst) + 1)
            }
            FlowStatus::Running => Err(FlowEngineError::FlowBusy(self.flow_id)),
            FlowStatus::Terminated => Err(FlowEngineError::FlowAlreadyTerminated(self.flow_id)),
        }
    }

    /// Transición Running → Suspended al cerrar un turno. Un contexto ya
    /// TERMINATED (abandono en carrera con el turno en curso) conserva su
    /// marca terminal. Devuelve si la transición ocurrió.
    pub fn mark_suspended(&self, view_name: Option<String>) -> bool {
        let mut st = self.status.lock().expect("flow status lock poisoned");
        if *st != FlowStatus::Running {
            return false;
        }
        *st = FlowStatus::Suspended;
        drop(st);
        if view_name.is_some() {
            *self.last_view.lock().expect("flow view lock poisoned") = view_name;
        }
        *self.last_touched.lock().expect("flow touch lock poisoned") = Utc::now();
        true
    }

    /// Marca terminal. Devuelve false si el flujo ya estaba terminado (la
    /// terminación es de una sola vez; los llamadores deciden el error).
    pub fn mark_terminated(&self) -> bool {
        let mut st = self.status.lock().expect("flow status lock poisoned");
        if *st == FlowStatus::Terminated {
            return false;
        }
        *st = FlowStatus::Terminated;
        true
    }

    pub fn info(&self) -> FlowInfo {
        FlowInfo { flow_id: self.flow_id,
                   script: self.script.clone(),
                   status: self.status(),
                   step: self.step(),
                   last_view: self.last_view.lock().expect("flow view lock poisoned").clone(),
                   started_at: self.started_at,
                   last_touched: self.last_touched() }
    }
}
