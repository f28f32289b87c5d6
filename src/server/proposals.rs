//! Proposal lifecycle routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::domain::{Candidates, ClaimedJob, Proposal, ProposalRequest, ProposalState};
use crate::server::{ApiError, AppState};

/// Body of `POST /proposals/{id}/mark_failed`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkFailedRequest {
    pub msg: String,
}

/// POST /proposals — create a proposal, returns the stored record.
async fn create_proposal(
    State(state): State<AppState>,
    Json(request): Json<ProposalRequest>,
) -> Result<Json<Proposal>, ApiError> {
    Ok(Json(state.service.create(request).await?))
}

/// GET /proposals/claim — atomically claim the oldest open proposal.
///
/// 404 with "No proposals to claim" is the normal empty-queue signal.
async fn claim_proposal(State(state): State<AppState>) -> Result<Json<ClaimedJob>, ApiError> {
    match state.service.claim().await? {
        Some(job) => Ok(Json(job)),
        None => Err(ApiError::not_found("No proposals to claim")),
    }
}

/// GET /proposals/{id}
async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Proposal>, ApiError> {
    Ok(Json(state.service.get(id).await?))
}

/// GET /proposals/{id}/state
async fn get_state(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProposalState>, ApiError> {
    Ok(Json(state.service.get_state(id).await?))
}

/// GET /proposals/{id}/candidates — result table of a finished proposal.
async fn get_candidates(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Candidates>, ApiError> {
    Ok(Json(state.service.get_candidates(id).await?))
}

/// POST /proposals/{id}/mark_processed — report a successful outcome.
async fn mark_processed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(candidates): Json<Candidates>,
) -> Result<Json<ProposalState>, ApiError> {
    Ok(Json(state.service.mark_processed(id, candidates).await?))
}

/// POST /proposals/{id}/mark_failed — report a failed outcome.
async fn mark_failed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<MarkFailedRequest>,
) -> Result<Json<ProposalState>, ApiError> {
    Ok(Json(state.service.mark_failed(id, request.msg).await?))
}

/// GET /proposals — all proposals.
async fn list_proposals(State(state): State<AppState>) -> Result<Json<Vec<Proposal>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/proposals", post(create_proposal).get(list_proposals))
        .route("/proposals/claim", get(claim_proposal))
        .route("/proposals/{id}", get(get_proposal))
        .route("/proposals/{id}/state", get(get_state))
        .route("/proposals/{id}/candidates", get(get_candidates))
        .route("/proposals/{id}/mark_processed", post(mark_processed))
        .route("/proposals/{id}/mark_failed", post(mark_failed))
}
