//! Vista pendiente de entrega al sumidero de salida.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Nombre de vista + modelo de datos que el colaborador externo renderiza.
/// El motor no interpreta el modelo; solo le inyecta la identidad del flujo
/// al suspender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewResponse {
    pub view_name: String,
    pub model: Value,
}

impl ViewResponse {
    pub fn new(view_name: impl Into<String>, model: Value) -> Self {
        Self { view_name: view_name.into(),
               model }
    }

    /// Acceso cómodo a una clave del modelo (objetos solamente).
    pub fn model_get(&self, key: &str) -> Option<&Value> {
        self.model.as_object().and_then(|m| m.get(key))
    }
}
