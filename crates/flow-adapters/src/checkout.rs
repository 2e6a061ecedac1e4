//! Flujo de ejemplo: checkout en cuatro páginas.
//!
//! Dirección de envío en "index", facturación sembrada con el envío en
//! "billingAddress", confirmación y "thankyou" terminal. Escrito como una
//! ejecución lineal: cada `respond_and_wait` cruza una petición HTTP.

use async_trait::async_trait;
use flow_core::{FlowScope, FlowScript, ScriptError};
use serde_json::json;

use crate::fields::{prompt_until_valid, FieldDescriptor};

/// Campos de una dirección postal; `state` es el único opcional.
pub fn address_fields() -> Vec<FieldDescriptor> {
    vec![FieldDescriptor::required("name"),
         FieldDescriptor::required("street"),
         FieldDescriptor::required("city"),
         FieldDescriptor::required("zip"),
         FieldDescriptor::optional("state"),
         FieldDescriptor::required("country")]
}

pub struct CheckoutFlow;

#[async_trait]
impl FlowScript for CheckoutFlow {
    async fn run(&self, scope: &mut FlowScope) -> Result<(), ScriptError> {
        let fields = address_fields();

        let shipping = prompt_until_valid(scope, "index", &fields, json!({})).await?;
        let billing = prompt_until_valid(scope, "billingAddress", &fields, shipping.clone()).await?;

        let addresses = json!({
            "shippingAddress": shipping,
            "billingAddress": billing,
        });
        scope.respond_and_wait("confirm", addresses).await?;

        scope.respond("thankyou", json!({}));
        Ok(())
    }
}
