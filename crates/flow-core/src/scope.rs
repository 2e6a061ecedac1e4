//! El scope de flujo: primitiva de suspensión y puente de E/S de vistas.
//!
//! Cada flujo corre en su propia tarea tokio con un `FlowScope` exclusivo.
//! `respond` anota la vista pendiente; `wait` es la primitiva de
//! suspensión: entrega la vista por el canal de respuesta del turno en
//! curso y aparca la tarea en el canal de mandos hasta que el despachador
//! la despierte con el siguiente `InputRecord`. La "instantánea" del flujo
//! es exactamente esta tarea aparcada: pila, cursores de bucle y locales
//! quedan intactos sin serialización manual.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::constants::STATE_ID_KEY;
use crate::errors::ScriptError;
use crate::model::{InputRecord, ViewResponse};
use crate::script::{self, ScriptStorage};

/// Mandos que el despachador envía a la tarea aparcada.
pub(crate) enum FlowCommand {
    /// Despierta el `wait` pendiente con la entrada de la nueva petición y
    /// el canal por el que responder el siguiente turno.
    Resume {
        input: InputRecord,
        reply: oneshot::Sender<FlowTurn>,
    },
    /// Señal de cancelación explícita (abandono o expiración). Dentro del
    /// script aflora como `ScriptError::Terminated`.
    Terminate,
}

/// Desenlace de un turno de ejecución, devuelto al despachador.
pub(crate) enum FlowTurn {
    Suspended { view: Option<ViewResponse> },
    Completed { view: Option<ViewResponse> },
    Failed { error: ScriptError },
}

/// Entorno de ejecución que el motor entrega al script. Vive dentro de la
/// tarea del flujo; fuera de una ejecución gestionada no puede construirse.
pub struct FlowScope {
    flow_id: Uuid,
    commands: mpsc::Receiver<FlowCommand>,
    reply: Option<oneshot::Sender<FlowTurn>>,
    pending_view: Option<ViewResponse>,
    about_to_suspend: Arc<AtomicBool>,
    scripts: Arc<dyn ScriptStorage>,
    current_dir: String,
}

impl FlowScope {
    pub(crate) fn new(flow_id: Uuid,
                      commands: mpsc::Receiver<FlowCommand>,
                      reply: oneshot::Sender<FlowTurn>,
                      about_to_suspend: Arc<AtomicBool>,
                      scripts: Arc<dyn ScriptStorage>,
                      current_dir: String)
                      -> Self {
        Self { flow_id,
               commands,
               reply: Some(reply),
               pending_view: None,
               about_to_suspend,
               scripts,
               current_dir }
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    /// Anota la vista pendiente. Puede llamarse varias veces antes de un
    /// `wait`; la última llamada gana, igual que en el original.
    pub fn respond(&mut self, view_name: impl Into<String>, model: Value) {
        self.pending_view = Some(ViewResponse::new(view_name, model));
    }

    /// Primitiva de suspensión. Entrega la vista pendiente (con la
    /// identidad del flujo inyectada bajo `stateId`) y aparca la tarea
    /// hasta la siguiente petición. Devuelve el `InputRecord` de esa
    /// petición, o `Terminated` si el flujo fue abandonado o expiró
    /// mientras esperaba.
    pub async fn wait(&mut self) -> Result<InputRecord, ScriptError> {
        let reply = self.reply.take().ok_or(ScriptError::SuspendOutsideFlow)?;
        let view = self.take_pending_view_with_state_id();
        self.about_to_suspend.store(true, Ordering::SeqCst);
        if reply.send(FlowTurn::Suspended { view }).is_err() {
            self.about_to_suspend.store(false, Ordering::SeqCst);
            return Err(ScriptError::Terminated);
        }
        let command = self.commands.recv().await;
        self.about_to_suspend.store(false, Ordering::SeqCst);
        match command {
            Some(FlowCommand::Resume { input, reply }) => {
                self.reply = Some(reply);
                Ok(input)
            }
            Some(FlowCommand::Terminate) | None => Err(ScriptError::Terminated),
        }
    }

    /// Composición `respond` + `wait`.
    pub async fn respond_and_wait(&mut self,
                                  view_name: impl Into<String>,
                                  model: Value)
                                  -> Result<InputRecord, ScriptError> {
        self.respond(view_name, model);
        self.wait().await
    }

    /// Verdadero exactamente mientras la ejecución está entregada a una
    /// suspensión (entre ceder la vista y ser despertada). Los guardas de
    /// limpieza lo consultan para no liberar recursos cuando la pila se
    /// desmonta por una suspensión en vez de por una salida genuina.
    pub fn is_about_to_suspend(&self) -> bool {
        self.about_to_suspend.load(Ordering::SeqCst)
    }

    /// Crea un guarda de limpieza ligado a este flujo. El closure corre al
    /// soltarse el guarda salvo que el desmontaje venga de una suspensión.
    pub fn cleanup_guard<F: FnOnce()>(&self, release: F) -> CleanupGuard<F> {
        CleanupGuard { flag: self.about_to_suspend.clone(),
                       release: Some(release) }
    }

    /// Ejecuta un sub-script dentro de este mismo scope: un `wait` en el
    /// incluido suspende el flujo entero. Las rutas relativas se resuelven
    /// contra el directorio del script en curso.
    pub async fn include(&mut self, name: &str) -> Result<(), ScriptError> {
        let resolved = script::resolve_script_path(&self.current_dir, name)?;
        let sub = self.scripts
                      .get_script(&resolved)
                      .ok_or_else(|| ScriptError::ScriptNotFound(resolved.clone()))?;
        let saved = std::mem::replace(&mut self.current_dir, script::directory_of(&resolved).to_string());
        let result = sub.run(self).await;
        self.current_dir = saved;
        result
    }

    /// Cierra el turno final del flujo. Se llama desde la tarea del flujo
    /// cuando el script retorna; con `Terminated` no hay turno que
    /// responder (el despachador ya dio el flujo por terminado).
    pub(crate) fn finish(mut self, result: Result<(), ScriptError>) {
        let turn = match result {
            Ok(()) => FlowTurn::Completed { view: self.pending_view.take() },
            Err(ScriptError::Terminated) => return,
            Err(error) => FlowTurn::Failed { error },
        };
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(turn);
        }
    }

    fn take_pending_view_with_state_id(&mut self) -> Option<ViewResponse> {
        let mut view = self.pending_view.take()?;
        if let Value::Object(map) = &mut view.model {
            map.insert(STATE_ID_KEY.to_string(), Value::String(self.flow_id.to_string()));
        }
        Some(view)
    }
}

/// Guarda de limpieza consciente de suspensiones.
///
/// Equivalente del patrón `finally { if (!isGoingToWait()) ... }` del
/// original: el closure de liberación corre en cualquier salida genuina
/// (retorno normal, error, terminación), pero se omite si el futuro del
/// script se desmonta mientras está aparcado en una suspensión.
pub struct CleanupGuard<F: FnOnce()> {
    flag: Arc<AtomicBool>,
    release: Option<F>,
}

impl<F: FnOnce()> CleanupGuard<F> {
    /// Desactiva el guarda sin ejecutar la liberación.
    pub fn disarm(mut self) {
        self.release = None;
    }
}

impl<F: FnOnce()> Drop for CleanupGuard<F> {
    fn drop(&mut self) {
        if self.flag.load(Ordering::SeqCst) {
            return;
        }
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
