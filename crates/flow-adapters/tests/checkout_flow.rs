//! Escenario completo del flujo de checkout a través del despachador:
//! index → billingAddress → confirm → thankyou, con re-prompt de
//! validación idempotente en la página de facturación.

use std::sync::Arc;

use flow_adapters::CheckoutFlow;
use flow_core::{FlowEngine, FlowEngineError, FlowOutcome, InputRecord, ViewResponse};
use uuid::Uuid;

fn engine_with_checkout() -> FlowEngine<flow_core::InMemoryEventStore, flow_core::InMemoryScriptStorage> {
    let engine = FlowEngine::in_memory().build();
    engine.scripts().register("checkout", Arc::new(CheckoutFlow));
    engine
}

fn shipping_input() -> InputRecord {
    InputRecord::from_pairs([("name", "A"),
                             ("street", "B"),
                             ("city", "C"),
                             ("zip", "D"),
                             ("country", "E")])
}

fn field_str<'a>(view: &'a ViewResponse, key: &str) -> Option<&'a str> {
    view.model_get(key).and_then(|v| v.as_str())
}

fn expect_suspended(out: FlowOutcome) -> (Uuid, ViewResponse) {
    match out {
        FlowOutcome::Suspended { flow_id, view } => (flow_id, view.expect("suspended view present")),
        FlowOutcome::Completed { .. } => panic!("flow completed too early"),
    }
}

#[tokio::test]
async fn checkout_scenario_end_to_end() {
    let engine = engine_with_checkout();

    // Arranque sin identidad: página "index" con modelo vacío (más el
    // stateId que el motor inyecta al suspender).
    let out = engine.dispatch(None, "checkout", InputRecord::new())
                    .await
                    .expect("start should suspend at index");
    let (flow_id, view) = expect_suspended(out);
    assert_eq!(view.view_name, "index");
    let model = view.model.as_object().expect("object model");
    assert_eq!(model.len(), 1, "only stateId expected in the empty model");
    assert_eq!(field_str(&view, "stateId"), Some(flow_id.to_string().as_str()));

    // Envío completo sin "state" (opcional): pasa la validación y siembra
    // la página de facturación.
    let out = engine.dispatch(Some(flow_id), "checkout", shipping_input())
                    .await
                    .expect("shipping should validate");
    let (_, view) = expect_suspended(out);
    assert_eq!(view.view_name, "billingAddress");
    assert_eq!(field_str(&view, "name"), Some("A"));
    assert_eq!(field_str(&view, "street"), Some("B"));
    assert_eq!(field_str(&view, "country"), Some("E"));
    assert!(view.model_get("errors").is_none());

    // Facturación sin "name": re-render de la misma vista con el error
    // anotado y los campos tecleados preservados.
    let missing_name = InputRecord::from_pairs([("street", "X"),
                                                ("city", "C"),
                                                ("zip", "D"),
                                                ("country", "E")]);
    let out = engine.resume(flow_id, missing_name.clone())
                    .await
                    .expect("validation failure is not an engine error");
    let (_, view) = expect_suspended(out);
    assert_eq!(view.view_name, "billingAddress");
    assert_eq!(view.model_get("errors")
                   .and_then(|e| e.get("name"))
                   .and_then(|v| v.as_str()),
               Some("requiredField"));
    assert_eq!(field_str(&view, "street"), Some("X"));
    assert!(view.model_get("name").is_none());

    // Idempotencia del re-prompt: la misma entrada produce la misma vista
    // y el mismo conjunto de errores, sin avanzar el flujo.
    let out = engine.resume(flow_id, missing_name).await.expect("same re-prompt");
    let (_, view) = expect_suspended(out);
    assert_eq!(view.view_name, "billingAddress");
    assert_eq!(view.model_get("errors")
                   .and_then(|e| e.get("name"))
                   .and_then(|v| v.as_str()),
               Some("requiredField"));
    assert_eq!(field_str(&view, "street"), Some("X"),
               "previously entered fields must not be lost");

    // Facturación completa: confirmación con ambas direcciones.
    let billing = InputRecord::from_pairs([("name", "F"),
                                           ("street", "G"),
                                           ("city", "H"),
                                           ("zip", "I"),
                                           ("country", "J")]);
    let out = engine.resume(flow_id, billing).await.expect("billing should validate");
    let (_, view) = expect_suspended(out);
    assert_eq!(view.view_name, "confirm");
    assert_eq!(view.model_get("shippingAddress")
                   .and_then(|a| a.get("name"))
                   .and_then(|v| v.as_str()),
               Some("A"));
    assert_eq!(view.model_get("billingAddress")
                   .and_then(|a| a.get("name"))
                   .and_then(|v| v.as_str()),
               Some("F"));

    // Cualquier entrada confirma: "thankyou" y terminación del flujo.
    let out = engine.resume(flow_id, InputRecord::from_pairs([("ok", "yes")]))
                    .await
                    .expect("confirm should complete the flow");
    assert!(out.is_completed());
    assert_eq!(out.view().expect("final view").view_name, "thankyou");

    // Consumo de una sola vez.
    let err = engine.resume(flow_id, InputRecord::new()).await.unwrap_err();
    assert_eq!(err, FlowEngineError::FlowAlreadyTerminated(flow_id));

    assert_eq!(engine.event_variants(flow_id),
               vec!["I", "W", "R", "W", "R", "W", "R", "W", "R", "W", "R", "C"]);
    assert!(engine.flow_fingerprint(flow_id).is_some());
}

#[tokio::test]
async fn empty_required_value_counts_as_missing() {
    let engine = engine_with_checkout();

    let out = engine.start("checkout").await.expect("start");
    let (flow_id, _) = expect_suspended(out);

    // "name" presente pero vacío: misma marca requiredField; el valor
    // vacío se ecoa igual que en el original.
    let input = InputRecord::from_pairs([("name", ""),
                                         ("street", "B"),
                                         ("city", "C"),
                                         ("zip", "D"),
                                         ("country", "E")]);
    let out = engine.resume(flow_id, input).await.expect("re-prompt");
    let (_, view) = expect_suspended(out);
    assert_eq!(view.view_name, "index");
    assert_eq!(view.model_get("errors")
                   .and_then(|e| e.get("name"))
                   .and_then(|v| v.as_str()),
               Some("requiredField"));
    assert_eq!(view.model_get("name").and_then(|v| v.as_str()), Some(""));
}

#[tokio::test]
async fn two_interactions_run_in_parallel_without_crossover() {
    let engine = Arc::new(engine_with_checkout());

    let a = engine.start("checkout").await.expect("flow a");
    let b = engine.start("checkout").await.expect("flow b");
    let (a_id, _) = expect_suspended(a);
    let (b_id, _) = expect_suspended(b);
    assert_ne!(a_id, b_id);

    // Avanza solo el flujo A; B sigue aparcado en "index".
    let out = engine.resume(a_id, shipping_input()).await.expect("a advances");
    let (_, view) = expect_suspended(out);
    assert_eq!(view.view_name, "billingAddress");

    let info_b = engine.flow_info(b_id).expect("b info");
    assert_eq!(info_b.last_view.as_deref(), Some("index"));
    assert_eq!(info_b.step, 0);
}
