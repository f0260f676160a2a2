//! Service health handler.

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use outlet_rig::chat::ChatService;
use outlet_rig::rag::InitializationGuard;

use crate::extract::Json;
use crate::handler::{HealthResponse, HealthStatus};
use crate::service::ServiceState;

/// Tracing target for health checks.
const TRACING_TARGET: &str = "outlet_server::handler::health";

/// Reports whether the outlet index is built.
///
/// Always answers `200 OK`: an index that is not built yet only degrades
/// semantic search, conversations are still served.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(initialization_guard): State<InitializationGuard>,
    State(chat_service): State<ChatService>,
) -> Json<HealthResponse> {
    let index_ready = initialization_guard.is_ready();
    let documents = initialization_guard.document_count().await;

    let status = if index_ready {
        HealthStatus::Ok
    } else {
        HealthStatus::Degraded
    };

    tracing::debug!(
        target: TRACING_TARGET,
        status = %status,
        documents,
        "Health status check requested"
    );

    Json(HealthResponse {
        status,
        index_ready,
        documents,
        model: chat_service.model_name().to_owned(),
    })
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}

#[cfg(test)]
mod test {
    use crate::handler::test::{create_test_server_with_state, create_test_state};

    #[tokio::test]
    async fn health_is_degraded_before_first_build() -> anyhow::Result<()> {
        let server = create_test_server_with_state(create_test_state()?)?;

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["indexReady"], false);
        assert_eq!(body["documents"], 0);
        assert_eq!(body["model"], "retrieval-echo");
        Ok(())
    }

    #[tokio::test]
    async fn health_is_ok_after_warm_up() -> anyhow::Result<()> {
        let state = create_test_state()?;
        assert!(state.chat_service().warm_up().await);
        let server = create_test_server_with_state(state)?;

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["indexReady"], true);
        assert_eq!(body["documents"], 2);
        Ok(())
    }

    #[tokio::test]
    async fn health_reflects_build_triggered_by_chat() -> anyhow::Result<()> {
        let server = create_test_server_with_state(create_test_state()?)?;

        server
            .post("/api/chat")
            .json(&serde_json::json!({
                "messages": [{ "role": "user", "content": "Bangsar" }]
            }))
            .await
            .assert_status_ok();

        let body: serde_json::Value = server.get("/health").await.json();
        assert_eq!(body["indexReady"], true);
        Ok(())
    }
}
