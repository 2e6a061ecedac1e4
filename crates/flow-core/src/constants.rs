//! Constantes del motor core.
//!
//! `ENGINE_VERSION` participa en el cálculo del fingerprint de un flujo
//! completado: un cambio de versión del motor invalida los fingerprints
//! aunque el script y la secuencia de vistas no cambien. Mantener estable
//! mientras no haya cambios incompatibles en la semántica de reanudación.

/// Versión lógica del motor de flujos.
pub const ENGINE_VERSION: &str = "JF1.0";

/// Clave del modelo bajo la que se inyecta la identidad del flujo al
/// suspender. La vista debe devolverla al cliente para la siguiente
/// petición.
pub const STATE_ID_KEY: &str = "stateId";
