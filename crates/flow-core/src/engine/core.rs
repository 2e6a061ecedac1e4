//! Core FlowEngine implementation
//!
//! El despachador de reanudación: recibe peticiones, arranca o despierta
//! la ejecución aparcada del flujo correspondiente y devuelve la vista que
//! el script entregó antes de suspenderse o terminar.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::constants::ENGINE_VERSION;
use crate::engine::builder::EngineBuilder;
use crate::engine::context::FlowContext;
use crate::engine::interceptor::FlowExecutionInterceptor;
use crate::errors::{FlowEngineError, ScriptError};
use crate::event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
use crate::hashing::hash_value;
use crate::model::{FlowInfo, FlowOutcome, FlowStatus, InputRecord};
use crate::scope::{FlowCommand, FlowScope, FlowTurn};
use crate::script::{directory_of, InMemoryScriptStorage, ScriptStorage};

/// Motor de flujos suspendibles.
///
/// Cada flujo vivo posee su propia tarea tokio aparcada en el punto de
/// suspensión; el motor solo guarda el extremo del canal que la despierta.
/// Entre flujos distintos la ejecución es totalmente paralela; dentro de
/// un mismo flujo las reanudaciones son estrictamente secuenciales
/// (`FlowBusy` ante colisión, fallo rápido).
pub struct FlowEngine<E, S>
    where E: EventStore,
          S: ScriptStorage
{
    event_store: Arc<E>,
    scripts: Arc<S>,
    flows: Arc<DashMap<Uuid, Arc<FlowContext>>>,
    config: EngineConfig,
    interceptors: Vec<Arc<dyn FlowExecutionInterceptor>>,
}

impl FlowEngine<InMemoryEventStore, InMemoryScriptStorage> {
    /// Builder con stores en memoria.
    #[inline]
    pub fn in_memory() -> EngineBuilder<InMemoryEventStore, InMemoryScriptStorage> {
        EngineBuilder::new(InMemoryEventStore::new(), InMemoryScriptStorage::new())
    }
}

impl<E, S> FlowEngine<E, S>
    where E: EventStore + 'static,
          S: ScriptStorage + 'static
{
    /// Crea un nuevo builder para configurar el motor.
    #[inline]
    pub fn builder(event_store: E, scripts: S) -> EngineBuilder<E, S> {
        EngineBuilder::new(event_store, scripts)
    }

    pub(crate) fn from_parts(event_store: E,
                             scripts: S,
                             config: EngineConfig,
                             interceptors: Vec<Arc<dyn FlowExecutionInterceptor>>)
                             -> Self {
        Self { event_store: Arc::new(event_store),
               scripts: Arc::new(scripts),
               flows: Arc::new(DashMap::new()),
               config,
               interceptors }
    }

    /// Acceso al storage de scripts (p. ej. para registrar flujos tras la
    /// construcción del motor).
    pub fn scripts(&self) -> &S {
        &self.scripts
    }

    /// Punto de entrada único del despachador (§ contrato: identidad
    /// ausente = arranque en frío sin entrada ligada; identidad presente =
    /// reanudación con el registro de entrada de la petición).
    pub async fn dispatch(&self,
                          flow_id: Option<Uuid>,
                          script_name: &str,
                          input: InputRecord)
                          -> Result<FlowOutcome, FlowEngineError> {
        match flow_id {
            None => self.start(script_name).await,
            Some(id) => self.resume(id, input).await,
        }
    }

    /// Arranca un flujo nuevo y lo ejecuta hasta su primera suspensión o
    /// hasta que el script termine sin suspenderse.
    pub async fn start(&self, script_name: &str) -> Result<FlowOutcome, FlowEngineError> {
        self.make_room();

        let script = self.scripts
                         .get_script(script_name)
                         .ok_or_else(|| FlowEngineError::Script(ScriptError::ScriptNotFound(script_name.to_string())))?;

        let flow_id = Uuid::new_v4();
        for i in &self.interceptors {
            i.before_start(flow_id, script_name);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(self.config.command_capacity);
        let (reply_tx, reply_rx) = oneshot::channel();
        let suspend_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let mut scope = FlowScope::new(flow_id,
                                       cmd_rx,
                                       reply_tx,
                                       suspend_flag,
                                       self.scripts.clone() as Arc<dyn ScriptStorage>,
                                       directory_of(script_name).to_string());

        let ctx = Arc::new(FlowContext::new(flow_id, script_name, cmd_tx));
        self.flows.insert(flow_id, ctx.clone());
        self.event_store
            .append_kind(flow_id, FlowEventKind::FlowStarted { script: script_name.to_string() });
        info!(%flow_id, script = script_name, "flow started");

        tokio::spawn(async move {
            let result = script.run(&mut scope).await;
            scope.finish(result);
        });

        let turn = self.await_turn(&ctx, reply_rx).await?;
        self.settle(&ctx, turn)
    }

    /// Despierta la ejecución aparcada de un flujo suspendido, le entrega
    /// la entrada de la petición y corre hasta la siguiente suspensión o
    /// la terminación del script.
    pub async fn resume(&self, flow_id: Uuid, input: InputRecord) -> Result<FlowOutcome, FlowEngineError> {
        let ctx = self.get(flow_id)?;
        let step = ctx.try_begin_resume()?;
        self.event_store.append_kind(flow_id, FlowEventKind::FlowResumed { step });
        debug!(%flow_id, step, "flow resumed");

        let (reply_tx, reply_rx) = oneshot::channel();
        if ctx.commands
              .send(FlowCommand::Resume { input, reply: reply_tx })
              .await
              .is_err()
        {
            // La tarea ya no existe: el flujo murió por debajo nuestro.
            ctx.mark_terminated();
            return Err(FlowEngineError::FlowAlreadyTerminated(flow_id));
        }

        let turn = self.await_turn(&ctx, reply_rx).await?;
        self.settle(&ctx, turn)
    }

    /// Abandono explícito: libera la tarea aparcada y deja el contexto como
    /// lápida TERMINATED. Los guardas de limpieza del script corren con
    /// `is_about_to_suspend() == false`.
    pub fn terminate(&self, flow_id: Uuid) -> Result<(), FlowEngineError> {
        let ctx = self.get(flow_id)?;
        if !ctx.mark_terminated() {
            return Err(FlowEngineError::FlowAlreadyTerminated(flow_id));
        }
        let _ = ctx.commands.try_send(FlowCommand::Terminate);
        self.event_store.append_kind(flow_id, FlowEventKind::FlowAbandoned);
        for i in &self.interceptors {
            i.after_termination(flow_id, None);
        }
        info!(%flow_id, "flow abandoned");
        Ok(())
    }

    /// Barrido de expiración: termina flujos suspendidos cuya inactividad
    /// supera la ventana configurada y retira lápidas ya vencidas.
    /// Devuelve cuántos flujos expiró.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut victims = Vec::new();
        let mut tombstones = Vec::new();
        for entry in self.flows.iter() {
            let ctx = entry.value();
            // Contexto RUNNING con el canal de mandos cerrado: la tarea
            // murió a mitad de turno (el resume que la atendía se canceló
            // antes de recibir la respuesta). Se recupera sin esperar la
            // ventana de inactividad.
            if ctx.status() == FlowStatus::Running && ctx.commands.is_closed() {
                victims.push(ctx.clone());
                continue;
            }
            let idle_for = (now - ctx.last_touched()).to_std().unwrap_or_default();
            if idle_for < self.config.idle_expiry {
                continue;
            }
            match ctx.status() {
                FlowStatus::Suspended => victims.push(ctx.clone()),
                FlowStatus::Terminated => tombstones.push(ctx.flow_id),
                FlowStatus::Running => {}
            }
        }
        for ctx in &victims {
            self.expire(ctx);
        }
        for id in tombstones {
            self.flows.remove(&id);
        }
        victims.len()
    }

    /// Instantánea diagnóstica de un flujo, si se conoce.
    pub fn flow_info(&self, flow_id: Uuid) -> Option<FlowInfo> {
        self.flows.get(&flow_id).map(|e| e.value().info())
    }

    /// Lista eventos registrados para un flujo.
    pub fn events_for(&self, flow_id: Uuid) -> Vec<FlowEvent> {
        self.event_store.list(flow_id)
    }

    /// Variante compacta de eventos, útil en asserts de tests.
    pub fn event_variants(&self, flow_id: Uuid) -> Vec<&'static str> {
        self.events_for(flow_id)
            .iter()
            .map(|e| match e.kind {
                FlowEventKind::FlowStarted { .. } => "I",
                FlowEventKind::FlowSuspended { .. } => "W",
                FlowEventKind::FlowResumed { .. } => "R",
                FlowEventKind::FlowCompleted { .. } => "C",
                FlowEventKind::FlowFailed { .. } => "X",
                FlowEventKind::FlowExpired => "E",
                FlowEventKind::FlowAbandoned => "A",
            })
            .collect()
    }

    /// Fingerprint del flujo si completó.
    pub fn flow_fingerprint(&self, flow_id: Uuid) -> Option<String> {
        self.events_for(flow_id).iter().rev().find_map(|e| match &e.kind {
                                                  FlowEventKind::FlowCompleted { flow_fingerprint } => {
                                                      Some(flow_fingerprint.clone())
                                                  }
                                                  _ => None,
                                              })
    }

    fn get(&self, flow_id: Uuid) -> Result<Arc<FlowContext>, FlowEngineError> {
        self.flows
            .get(&flow_id)
            .map(|e| e.value().clone())
            .ok_or(FlowEngineError::UnknownFlow(flow_id))
    }

    async fn await_turn(&self,
                        ctx: &Arc<FlowContext>,
                        reply_rx: oneshot::Receiver<FlowTurn>)
                        -> Result<FlowTurn, FlowEngineError> {
        match reply_rx.await {
            Ok(turn) => Ok(turn),
            Err(_) => {
                // La tarea soltó el canal sin responder (pánico del script).
                ctx.mark_terminated();
                self.event_store
                    .append_kind(ctx.flow_id, FlowEventKind::FlowFailed { error: "flow task dropped its reply channel".into() });
                warn!(flow_id = %ctx.flow_id, "flow task dropped its reply channel");
                Err(FlowEngineError::Internal("flow task dropped its reply channel".into()))
            }
        }
    }

    /// Cierra un turno: registra la transición y produce el resultado
    /// visible para el llamador.
    fn settle(&self, ctx: &Arc<FlowContext>, turn: FlowTurn) -> Result<FlowOutcome, FlowEngineError> {
        let flow_id = ctx.flow_id;
        match turn {
            FlowTurn::Suspended { view } => {
                let view_name = view.as_ref().map(|v| v.view_name.clone());
                // Un terminate en carrera con el turno gana: la marca
                // terminal se conserva y la suspensión no se registra.
                if ctx.mark_suspended(view_name.clone()) {
                    self.event_store
                        .append_kind(flow_id, FlowEventKind::FlowSuspended { step: ctx.step(), view_name });
                }
                Ok(FlowOutcome::Suspended { flow_id, view })
            }
            FlowTurn::Completed { view } => {
                ctx.mark_terminated();
                let fp = self.completion_fingerprint(ctx, view.as_ref().map(|v| v.view_name.as_str()));
                self.event_store
                    .append_kind(flow_id, FlowEventKind::FlowCompleted { flow_fingerprint: fp });
                for i in &self.interceptors {
                    i.after_termination(flow_id, None);
                }
                info!(%flow_id, "flow completed");
                Ok(FlowOutcome::Completed { flow_id, view })
            }
            FlowTurn::Failed { error } => {
                ctx.mark_terminated();
                self.event_store
                    .append_kind(flow_id, FlowEventKind::FlowFailed { error: error.to_string() });
                for i in &self.interceptors {
                    i.after_termination(flow_id, Some(&error));
                }
                warn!(%flow_id, %error, "flow failed");
                Err(match error {
                    ScriptError::SuspendOutsideFlow => FlowEngineError::SuspendOutsideFlow,
                    e => FlowEngineError::Script(e),
                })
            }
        }
    }

    /// Agrega la secuencia ordenada de vistas servidas en un fingerprint
    /// estable: dos ejecuciones con la misma conducta visible comparten
    /// fingerprint (propiedad de fidelidad de reanudación).
    fn completion_fingerprint(&self, ctx: &FlowContext, final_view: Option<&str>) -> String {
        let mut views: Vec<String> = self.event_store
                                         .list(ctx.flow_id)
                                         .iter()
                                         .filter_map(|e| match &e.kind {
                                             FlowEventKind::FlowSuspended { view_name: Some(v), .. } => Some(v.clone()),
                                             _ => None,
                                         })
                                         .collect();
        if let Some(v) = final_view {
            views.push(v.to_string());
        }
        hash_value(&json!({
                       "engine_version": ENGINE_VERSION,
                       "script": ctx.script,
                       "views": views,
                   }))
    }

    /// Garantiza hueco para un flujo nuevo expulsando, si hace falta, el
    /// suspendido menos recientemente tocado (semántica LRU del storage de
    /// sesión original).
    fn make_room(&self) {
        let live = self.flows
                       .iter()
                       .filter(|e| e.value().status() != FlowStatus::Terminated)
                       .count();
        if live < self.config.max_flows {
            return;
        }
        let victim = self.flows
                         .iter()
                         .filter(|e| e.value().status() == FlowStatus::Suspended)
                         .min_by_key(|e| e.value().last_touched())
                         .map(|e| e.value().clone());
        if let Some(ctx) = victim {
            warn!(flow_id = %ctx.flow_id, "evicting least recently used flow");
            self.expire(&ctx);
        }
    }

    fn expire(&self, ctx: &Arc<FlowContext>) {
        if !ctx.mark_terminated() {
            return;
        }
        let _ = ctx.commands.try_send(FlowCommand::Terminate);
        self.event_store.append_kind(ctx.flow_id, FlowEventKind::FlowExpired);
        for i in &self.interceptors {
            i.after_termination(ctx.flow_id, None);
        }
        info!(flow_id = %ctx.flow_id, "flow expired");
    }
}
