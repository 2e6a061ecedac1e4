//! Engine module: despachador de reanudación y registro de flujos.
//!
//! Provides the resume dispatcher, the per-flow context registry and the
//! lifecycle interceptor seam.

pub mod builder;
pub mod context;
pub mod core;
pub mod interceptor;

pub use builder::EngineBuilder;
pub use core::FlowEngine;
pub use interceptor::FlowExecutionInterceptor;

pub use crate::event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use crate::model::{FlowOutcome, FlowStatus};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    use crate::errors::{FlowEngineError, ScriptError};
    use crate::model::{FlowOutcome, FlowStatus, InputRecord};
    use crate::scope::FlowScope;
    use crate::script::FlowScript;
    use crate::FlowEngine;

    // Script de una sola página: responde y termina sin suspenderse.
    struct HelloScript;

    #[async_trait]
    impl FlowScript for HelloScript {
        async fn run(&self, scope: &mut FlowScope) -> Result<(), ScriptError> {
            scope.respond("hello", json!({ "greeting": "hola" }));
            Ok(())
        }
    }

    // Script de dos páginas: eco de la entrada recibida tras la suspensión.
    struct EchoScript;

    #[async_trait]
    impl FlowScript for EchoScript {
        async fn run(&self, scope: &mut FlowScope) -> Result<(), ScriptError> {
            let input = scope.respond_and_wait("first", json!({})).await?;
            let answer = input.get("answer").unwrap_or("").to_string();
            scope.respond("second", json!({ "answer": answer }));
            Ok(())
        }
    }

    #[tokio::test]
    async fn completes_without_suspension() {
        let engine = FlowEngine::in_memory().build();
        engine.scripts().register("hello", Arc::new(HelloScript));

        let out = engine.start("hello").await.expect("flow should complete");
        assert!(out.is_completed());
        let view = out.view().expect("final view present");
        assert_eq!(view.view_name, "hello");

        assert_eq!(engine.event_variants(out.flow_id()), vec!["I", "C"]);
        assert!(engine.flow_fingerprint(out.flow_id()).is_some());
    }

    #[tokio::test]
    async fn identical_runs_share_a_fingerprint() {
        let engine = FlowEngine::in_memory().build();
        engine.scripts().register("hello", Arc::new(HelloScript));

        let a = engine.start("hello").await.expect("first run");
        let b = engine.start("hello").await.expect("second run");
        assert_ne!(a.flow_id(), b.flow_id());

        // El fingerprint agrega la conducta visible (script + vistas), no
        // la identidad: dos ejecuciones idénticas comparten fingerprint.
        let fa = engine.flow_fingerprint(a.flow_id()).expect("fingerprint a");
        let fb = engine.flow_fingerprint(b.flow_id()).expect("fingerprint b");
        assert_eq!(fa, fb);
    }

    #[tokio::test]
    async fn suspends_and_resumes_with_input_bound() {
        let engine = FlowEngine::in_memory().build();
        engine.scripts().register("echo", Arc::new(EchoScript));

        let out = engine.start("echo").await.expect("start should suspend");
        let FlowOutcome::Suspended { flow_id, view } = out else {
            panic!("expected suspension at first view");
        };
        let view = view.expect("suspended view present");
        assert_eq!(view.view_name, "first");
        // La identidad viaja en el modelo bajo stateId.
        assert_eq!(view.model_get("stateId").and_then(|v| v.as_str()),
                   Some(flow_id.to_string().as_str()));
        assert_eq!(engine.flow_info(flow_id).expect("info").status, FlowStatus::Suspended);

        let out = engine.resume(flow_id, InputRecord::from_pairs([("answer", "42")]))
                        .await
                        .expect("resume should complete the flow");
        assert!(out.is_completed());
        let view = out.view().expect("final view present");
        assert_eq!(view.view_name, "second");
        assert_eq!(view.model_get("answer").and_then(|v| v.as_str()), Some("42"));

        // Consumo de una sola vez: el contexto queda como lápida terminada.
        let err = engine.resume(flow_id, InputRecord::new()).await.unwrap_err();
        assert_eq!(err, FlowEngineError::FlowAlreadyTerminated(flow_id));

        let err = engine.resume(Uuid::new_v4(), InputRecord::new()).await.unwrap_err();
        assert!(matches!(err, FlowEngineError::UnknownFlow(_)));

        assert_eq!(engine.event_variants(flow_id), vec!["I", "W", "R", "C"]);
    }
}
