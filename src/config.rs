//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) a través de `EngineConfig::from_env`
//! y expone una estructura inmutable (`CONFIG`).

use flow_core::EngineConfig;
use once_cell::sync::Lazy;

/// Configuración global de la aplicación (extensible para más secciones).
pub struct AppConfig {
    /// Parámetros operativos del motor de flujos.
    pub engine: EngineConfig,
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| AppConfig { engine: EngineConfig::from_env() });
