//! Trait de script y almacenamiento de scripts.
//!
//! El cargador/compilador de scripts es un colaborador externo: aquí solo
//! vive el contrato (`ScriptStorage`) y un registro en memoria. Un script
//! es cualquier lógica async que recibe el `FlowScope` del flujo y puede
//! suspenderse en él; los sub-scripts incluidos comparten el mismo scope,
//! de modo que un `wait()` dentro de un include suspende el flujo entero.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::errors::ScriptError;
use crate::scope::FlowScope;

/// Lógica de un flujo. Debe ser pura respecto al scope: toda la E/S de
/// vistas y entradas pasa por él.
#[async_trait]
pub trait FlowScript: Send + Sync {
    async fn run(&self, scope: &mut FlowScope) -> Result<(), ScriptError>;
}

/// Resolución nombre → script ejecutable.
pub trait ScriptStorage: Send + Sync {
    fn get_script(&self, path: &str) -> Option<Arc<dyn FlowScript>>;
}

/// Registro de scripts en memoria, clave = ruta lógica ("shop/checkout").
#[derive(Default)]
pub struct InMemoryScriptStorage {
    inner: RwLock<HashMap<String, Arc<dyn FlowScript>>>,
}

impl InMemoryScriptStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: impl Into<String>, script: Arc<dyn FlowScript>) {
        self.inner
            .write()
            .expect("script storage lock poisoned")
            .insert(path.into(), script);
    }
}

impl ScriptStorage for InMemoryScriptStorage {
    fn get_script(&self, path: &str) -> Option<Arc<dyn FlowScript>> {
        self.inner
            .read()
            .expect("script storage lock poisoned")
            .get(path)
            .cloned()
    }
}

/// Directorio lógico de una ruta de script ("shop/checkout" → "shop").
pub fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Resuelve una ruta de include contra el directorio del script en curso.
///
/// Rutas absolutas (prefijo `/`) se resuelven contra la raíz del storage.
/// Las relativas admiten componentes `../` iniciales; quedarse sin
/// directorios que subir es un error de resolución.
pub fn resolve_script_path(current_dir: &str, name: &str) -> Result<String, ScriptError> {
    if let Some(stripped) = name.strip_prefix('/') {
        return Ok(stripped.to_string());
    }
    let mut prefix = current_dir.to_string();
    let mut rest = name;
    while let Some(r) = rest.strip_prefix("../") {
        match prefix.rfind('/') {
            Some(i) => prefix.truncate(i),
            None => return Err(ScriptError::ScriptNotFound(format!("{current_dir}/{name}"))),
        }
        rest = r;
    }
    if prefix.is_empty() {
        Ok(rest.to_string())
    } else {
        Ok(format!("{prefix}/{rest}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_of_handles_root_level() {
        assert_eq!(directory_of("checkout"), "");
        assert_eq!(directory_of("shop/checkout"), "shop");
        assert_eq!(directory_of("a/b/c"), "a/b");
    }

    #[test]
    fn absolute_paths_resolve_against_root() {
        assert_eq!(resolve_script_path("shop", "/lib/util").unwrap(), "lib/util");
    }

    #[test]
    fn relative_paths_resolve_against_current_dir() {
        assert_eq!(resolve_script_path("shop", "util").unwrap(), "shop/util");
        assert_eq!(resolve_script_path("", "util").unwrap(), "util");
        assert_eq!(resolve_script_path("a/b", "../util").unwrap(), "a/util");
    }

    #[test]
    fn climbing_past_the_root_is_an_error() {
        assert!(matches!(resolve_script_path("shop", "../util"),
                         Err(ScriptError::ScriptNotFound(_))));
    }
}
