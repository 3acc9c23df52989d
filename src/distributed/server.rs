//! HTTP coordinator service
//!
//! # Endpoints
//!
//! | Method | Path             | Body / Query          | Response           |
//! |--------|------------------|-----------------------|--------------------|
//! | GET    | `/get_work`      | `?worker_id=<id>`     | `WorkAssignment`   |
//! | POST   | `/submit_result` | `RangeReport`         | `SubmitAck`        |
//! | GET    | `/status`        |                       | `GlobalStatus`     |
//! | GET    | `/divisors`      |                       | `DivisorsResponse` |
//! | GET    | `/`              |                       | plain-text summary |
//!
//! CORS is permissive so browser clients on other origins can take part.

use super::protocol::{
    DivisorsResponse, ErrorResponse, RangeReport, SubmitAck, WorkAssignment, WorkQuery, WorkerId,
};
use crate::coordinator::Coordinator;
use crate::error::SweepError;
use crate::stats::{GlobalStatus, StatusReporter};
use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

#[derive(Clone)]
struct ServerState {
    coordinator: Arc<Coordinator>,
    reporter: StatusReporter,
}

impl IntoResponse for SweepError {
    fn into_response(self) -> Response {
        let status = match &self {
            SweepError::MissingWorkerId
            | SweepError::InvalidNumber { .. }
            | SweepError::InvalidAssignment { .. } => StatusCode::BAD_REQUEST,
            SweepError::SearchExhausted { .. } => StatusCode::GONE,
            SweepError::NetworkFailure { .. } | SweepError::CoordinatorRejected { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Build the coordinator router
pub fn router(coordinator: Arc<Coordinator>, progress_horizon: u64) -> Router {
    let state = ServerState {
        reporter: StatusReporter::new(coordinator.clone(), progress_horizon),
        coordinator,
    };

    Router::new()
        .route("/", get(index))
        .route("/get_work", get(get_work))
        .route("/submit_result", post(submit_result))
        .route("/status", get(status))
        .route("/divisors", get(divisors))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `coordinator` on `listener` until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    coordinator: Arc<Coordinator>,
    progress_horizon: u64,
    shutdown: F,
) -> crate::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Coordinator listening on http://{}", addr);

    axum::serve(listener, router(coordinator, progress_horizon))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Coordinator server failed")?;

    info!("Coordinator server stopped");
    Ok(())
}

async fn index(State(state): State<ServerState>) -> String {
    state.reporter.summary_text()
}

async fn get_work(
    State(state): State<ServerState>,
    Query(query): Query<WorkQuery>,
) -> Result<Json<WorkAssignment>, SweepError> {
    let worker_id = query
        .worker_id
        .map(WorkerId::new)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(WorkerId::anonymous);

    let assignment = state.coordinator.issue(&worker_id)?;
    debug!(
        "GET /get_work: {} -> {}..={}",
        worker_id, assignment.start_range, assignment.end_range
    );
    Ok(Json(assignment))
}

async fn submit_result(
    State(state): State<ServerState>,
    Json(report): Json<RangeReport>,
) -> Result<Json<SubmitAck>, SweepError> {
    let outcome = state.coordinator.submit(report).map_err(|e| {
        warn!("POST /submit_result rejected: {}", e);
        e
    })?;
    Ok(Json(SubmitAck::from(outcome)))
}

async fn status(State(state): State<ServerState>) -> Json<GlobalStatus> {
    Json(state.reporter.status())
}

async fn divisors(State(state): State<ServerState>) -> Json<DivisorsResponse> {
    let divisors = state.reporter.divisors();
    Json(DivisorsResponse {
        total_count: divisors.len(),
        divisors,
    })
}
