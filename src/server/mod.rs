//! HTTP entrypoint for turn invocations.
//!
//! One endpoint drives the whole protocol: `POST /turn` carries either a
//! new human message or a confirmation for a pending gated call, and
//! returns a final answer, an awaiting-confirmation descriptor, or an
//! error. Infrastructure faults are rendered generically; only the
//! tool-budget fault is surfaced verbatim.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::{RunController, TurnInput, TurnOutcome, TurnRequest};
use crate::error::RunError;
use crate::history::PendingInterrupt;

/// Shared state for the turn API.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<RunController>,
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/turn", post(turn_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until the shutdown signal resolves, then drain in-flight turns.
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Turn API listening on {}:{}", host, port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[derive(Debug, Deserialize)]
struct TurnBody {
    thread_id: String,
    /// A new human message. Mutually exclusive with `confirmation`.
    message: Option<String>,
    /// Resolution of a pending gated call.
    confirmation: Option<ConfirmationBody>,
    user_id: Option<String>,
    /// Per-request override of the gated-tool set.
    gated_tools: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ConfirmationBody {
    call_id: String,
    approved: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum TurnResponse {
    Final {
        answer: String,
    },
    AwaitingConfirmation {
        interrupt: PendingInterrupt,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "questline",
    })
}

async fn turn_handler(
    State(state): State<AppState>,
    Json(body): Json<TurnBody>,
) -> (StatusCode, Json<TurnResponse>) {
    if body.thread_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(TurnResponse::Error {
                error: "thread_id is required".to_string(),
            }),
        );
    }

    let input = match (body.message, body.confirmation) {
        (Some(message), None) => TurnInput::Message(message),
        (None, Some(confirmation)) => TurnInput::Confirmation {
            call_id: confirmation.call_id,
            approved: confirmation.approved,
        },
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TurnResponse::Error {
                    error: "Provide exactly one of 'message' or 'confirmation'".to_string(),
                }),
            );
        }
    };

    let request = TurnRequest {
        thread_id: body.thread_id,
        input,
        user_id: body.user_id,
        gated_override: body.gated_tools.map(HashSet::from_iter),
    };

    match state.runner.run_turn(request).await {
        Ok(TurnOutcome::FinalAnswer(answer)) => {
            (StatusCode::OK, Json(TurnResponse::Final { answer }))
        }
        Ok(TurnOutcome::AwaitingConfirmation(interrupt)) => (
            StatusCode::OK,
            Json(TurnResponse::AwaitingConfirmation { interrupt }),
        ),
        Err(e) => {
            let status = match &e {
                RunError::ToolBudgetExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                RunError::ConfirmationMismatch { .. }
                | RunError::NoPendingConfirmation
                | RunError::ConfirmationRequired { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            // Never leak internals: only user-visible faults are
            // rendered verbatim.
            let error = if e.is_user_visible() || matches!(e, RunError::ConfirmationMismatch { .. })
            {
                e.to_string()
            } else {
                tracing::error!(error = %e, "turn failed");
                "Something went wrong processing this turn. Please try again.".to_string()
            };
            (status, Json(TurnResponse::Error { error }))
        }
    }
}
