//! Descriptores de campo y bucle de validación con re-prompt.
//!
//! El idioma canónico que el motor debe soportar barato: un bucle
//! ordinario que renderiza, se suspende, valida la entrada al reanudar y
//! vuelve a renderizar la misma vista con errores anotados hasta que la
//! validación pasa. El estado de iteración del bucle es exactamente el
//! tipo de local que la instantánea preserva entre peticiones.

use flow_core::{FlowScope, ScriptError};
use serde_json::{json, Map, Value};

/// Campo de formulario esperado por una vista de captura.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub optional: bool,
}

impl FieldDescriptor {
    pub const fn required(name: &'static str) -> Self {
        Self { name, optional: false }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self { name, optional: true }
    }
}

/// Renderiza `view_name`, se suspende y valida la entrada contra `fields`
/// al reanudar. Campos requeridos ausentes (o vacíos) marcan
/// `errors.<campo> = "requiredField"` y relanzan la misma vista con los
/// valores ya tecleados; cuando no hay errores devuelve el registro
/// validado. Los fallos de validación son datos, nunca errores de motor.
pub async fn prompt_until_valid(scope: &mut FlowScope,
                                view_name: &str,
                                fields: &[FieldDescriptor],
                                seed: Value)
                                -> Result<Value, ScriptError> {
    let mut model = seed;
    loop {
        let input = scope.respond_and_wait(view_name, model).await?;

        let mut record = Map::new();
        let mut errors = Map::new();
        for field in fields {
            let value = input.get(field.name);
            match value {
                Some(v) if !v.is_empty() => {
                    record.insert(field.name.to_string(), json!(v));
                }
                _ => {
                    if !field.optional {
                        errors.insert(field.name.to_string(), json!("requiredField"));
                    }
                    if let Some(v) = value {
                        record.insert(field.name.to_string(), json!(v));
                    }
                }
            }
        }

        if errors.is_empty() {
            return Ok(Value::Object(record));
        }
        record.insert("errors".to_string(), Value::Object(errors));
        model = Value::Object(record);
    }
}
