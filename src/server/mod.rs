//! HTTP surface: proposal lifecycle, synchronous candidate generation,
//! and the version probe.

mod candidates;
mod proposals;
mod versions;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_http::cors::CorsLayer;

use crate::error::ProposalError;
use crate::service::ProposalService;

pub use candidates::CandidatesRequest;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProposalService>,
}

/// Build the full application router.
pub fn app(service: Arc<ProposalService>) -> Router {
    let state = AppState { service };
    Router::new()
        .merge(proposals::routes())
        .merge(candidates::routes())
        .merge(versions::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// API error: a status code plus a `{"detail": …}` JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(detail = %self.detail, "Request failed");
        }
        (
            self.status,
            axum::Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

impl From<ProposalError> for ApiError {
    fn from(err: ProposalError) -> Self {
        match err {
            ProposalError::NotFound | ProposalError::CandidatesNotFound => {
                ApiError::not_found(err.to_string())
            }
            // The original API reports a row-count mismatch as 404.
            ProposalError::CandidateCountMismatch { .. } => ApiError::not_found(err.to_string()),
            ProposalError::Validation(_) => ApiError::unprocessable(err.to_string()),
            ProposalError::Store(e) => ApiError::internal(e.to_string()),
        }
    }
}
