//! Synchronous candidate generation, without a proposal record.

use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Candidates, Experiments, StrategySpec};
use crate::error::StrategyError;
use crate::server::{ApiError, AppState};
use crate::strategies;

/// Body of `POST /candidates/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesRequest {
    pub strategy_data: StrategySpec,
    #[serde(default = "default_n_candidates")]
    pub n_candidates: usize,
    #[serde(default)]
    pub experiments: Option<Experiments>,
    #[serde(default)]
    pub pendings: Option<Candidates>,
    /// Extra attempts after a non-sentinel strategy fault.
    #[serde(default = "default_n_restarts")]
    pub n_restarts: u32,
}

fn default_n_candidates() -> usize {
    1
}

fn default_n_restarts() -> u32 {
    1
}

/// POST /candidates/generate — run the strategy in-request.
///
/// The insufficient-experiments sentinel maps to 404 (queue depletion,
/// not a server fault); other faults are retried `n_restarts` times and
/// then reported as 500.
async fn generate(Json(request): Json<CandidatesRequest>) -> Result<Json<Candidates>, ApiError> {
    if request.n_candidates == 0 {
        return Err(ApiError::unprocessable(
            "n_candidates must be greater than 0",
        ));
    }
    let domain = request.strategy_data.domain();
    if let Some(experiments) = &request.experiments {
        domain
            .validate_experiments(experiments)
            .map_err(|e| ApiError::unprocessable(format!("experiments: {e}")))?;
    }
    if let Some(pendings) = &request.pendings {
        domain
            .validate_candidates(pendings)
            .map_err(|e| ApiError::unprocessable(format!("pendings: {e}")))?;
    }

    let mut attempt = 0;
    loop {
        let req = request.clone();
        let result = tokio::task::spawn_blocking(move || {
            strategies::propose(
                &req.strategy_data,
                req.experiments.as_ref(),
                req.pendings.as_ref(),
                req.n_candidates,
            )
        })
        .await
        .map_err(|e| ApiError::internal(format!("strategy execution aborted: {e}")))?;

        match result {
            Ok(candidates) => return Ok(Json(candidates)),
            Err(StrategyError::InsufficientExperiments) => {
                return Err(ApiError::not_found(
                    StrategyError::InsufficientExperiments.to_string(),
                ));
            }
            Err(e) if attempt < request.n_restarts => {
                warn!(attempt, error = %e, "Strategy attempt failed, restarting");
                attempt += 1;
            }
            Err(e) => {
                return Err(ApiError::internal(format!(
                    "An error occurred. Details: {e}"
                )));
            }
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/candidates/generate", post(generate))
}
