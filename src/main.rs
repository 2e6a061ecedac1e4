//! Demo del motor: recorre el flujo de checkout simulando las peticiones
//! de un cliente, identidad de flujo incluida (el `stateId` que viaja en
//! cada modelo suspendido es lo que el cliente devolvería en la petición
//! siguiente).

mod config;

use std::sync::Arc;

use flow_adapters::CheckoutFlow;
use flow_core::{FlowEngine, FlowOutcome, InputRecord, ViewResponse};
use uuid::Uuid;

use crate::config::CONFIG;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = FlowEngine::in_memory().config(CONFIG.engine.clone()).build();
    engine.scripts().register("checkout", Arc::new(CheckoutFlow));

    // Primera petición: sin identidad, arranque en frío.
    let out = engine.dispatch(None, "checkout", InputRecord::new()).await?;
    let mut state_id = print_turn(&out);

    let requests: Vec<InputRecord> = vec![
        // Dirección de envío completa ("state" es opcional).
        InputRecord::from_pairs([("name", "Ada Lovelace"),
                                 ("street", "Calle Mayor 1"),
                                 ("city", "Madrid"),
                                 ("zip", "28001"),
                                 ("country", "ES")]),
        // Facturación sin "name": provoca el re-prompt con error anotado.
        InputRecord::from_pairs([("street", "Gran Via 2"),
                                 ("city", "Madrid"),
                                 ("zip", "28002"),
                                 ("country", "ES")]),
        // Facturación completa.
        InputRecord::from_pairs([("name", "Ada Lovelace"),
                                 ("street", "Gran Via 2"),
                                 ("city", "Madrid"),
                                 ("zip", "28002"),
                                 ("country", "ES")]),
        // Confirmación.
        InputRecord::from_pairs([("ok", "yes")]),
    ];

    for input in requests {
        let id = state_id.ok_or("the previous view carried no stateId")?;
        let out = engine.dispatch(Some(id), "checkout", input).await?;
        state_id = print_turn(&out);
        if out.is_completed() {
            if let Some(fp) = engine.flow_fingerprint(out.flow_id()) {
                println!("fingerprint del flujo: {fp}");
            }
            break;
        }
    }

    let purged = engine.purge_expired();
    println!("flujos expirados en el barrido final: {purged}");
    Ok(())
}

/// Imprime el turno y devuelve el `stateId` que el cliente reenviaría.
fn print_turn(out: &FlowOutcome) -> Option<Uuid> {
    let label = if out.is_completed() { "fin" } else { "espera" };
    match out.view() {
        Some(view) => {
            println!("[{label}] vista \"{}\": {}",
                     view.view_name,
                     serde_json::to_string_pretty(&view.model).unwrap_or_default());
            state_id_of(view)
        }
        None => {
            println!("[{label}] sin vista");
            None
        }
    }
}

fn state_id_of(view: &ViewResponse) -> Option<Uuid> {
    view.model_get("stateId")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}
