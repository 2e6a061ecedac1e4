//! Registro de entrada: los valores con nombre que el cliente aporta en la
//! petición que reanuda un flujo. Transitorio: se construye por petición y
//! el script reanudado lo consume.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Mapa nombre → valor de los campos de la petición. Conserva el orden de
/// inserción (orden de los campos del formulario).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputRecord {
    inner: IndexMap<String, String>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construcción cómoda desde pares, pensada para tests y demos.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
        where I: IntoIterator<Item = (K, V)>,
              K: Into<String>,
              V: Into<String>
    {
        let inner = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { inner }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}
