//! flow-adapters: material a nivel de script sobre el motor flow-core.
//!
//! Aquí viven los patrones canónicos que los flujos reutilizan (el bucle
//! de validación con re-prompt) y el flujo de ejemplo de checkout.
pub mod checkout;
pub mod fields;

pub use checkout::{address_fields, CheckoutFlow};
pub use fields::{prompt_until_valid, FieldDescriptor};
