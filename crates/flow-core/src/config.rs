//! Configuración del motor.
//!
//! Carga opcional desde variables de entorno (.env vía dotenvy) siguiendo
//! la convención `JSFLOW_*`. La expiración por inactividad es una política
//! de recuperación de recursos, no un requisito de corrección del script.

use std::env;
use std::time::Duration;

/// Parámetros operativos del `FlowEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Máximo de flujos vivos (RUNNING o SUSPENDED). Al superarse se
    /// expulsa el flujo suspendido menos recientemente tocado.
    pub max_flows: usize,
    /// Ventana de inactividad tras la cual un flujo suspendido es elegible
    /// para expiración en `purge_expired`.
    pub idle_expiry: Duration,
    /// Capacidad del canal de mandos por flujo.
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_flows: 100,
               idle_expiry: Duration::from_secs(30 * 60),
               command_capacity: 4 }
    }
}

impl EngineConfig {
    /// Construye la configuración leyendo `JSFLOW_MAX_FLOWS` y
    /// `JSFLOW_IDLE_EXPIRY_SECS`; los ausentes caen al default.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        let max_flows = env::var("JSFLOW_MAX_FLOWS").ok()
                                                    .and_then(|v| v.parse().ok())
                                                    .unwrap_or(defaults.max_flows);
        let idle_secs = env::var("JSFLOW_IDLE_EXPIRY_SECS").ok()
                                                           .and_then(|v| v.parse().ok())
                                                           .map(Duration::from_secs)
                                                           .unwrap_or(defaults.idle_expiry);
        Self { max_flows,
               idle_expiry: idle_secs,
               command_capacity: defaults.command_capacity }
    }
}
