//! HTTP client for the worker, against the proposals API.

use reqwest::StatusCode;

use crate::domain::{Candidates, ClaimedJob, ProposalState};
use crate::error::ClientError;

/// JSON client for the backend.
///
/// Construction probes `GET /versions` and fails fast if the backend is
/// unreachable, so a misconfigured worker dies at startup instead of
/// spinning against a dead URL.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub async fn connect(base_url: &str) -> Result<Self, ClientError> {
        let client = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        };
        client
            .get_version()
            .await
            .map_err(|_| ClientError::Unreachable {
                url: base_url.to_string(),
            })?;
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /versions — connectivity probe.
    pub async fn get_version(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http
            .get(format!("{}/versions", self.base_url))
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;
        expect_ok(response).await?.json().await.map_err(|e| {
            ClientError::Request(format!("invalid version response: {e}"))
        })
    }

    /// GET /proposals/claim — `None` when the queue is empty.
    pub async fn claim_proposal(&self) -> Result<Option<ClaimedJob>, ClientError> {
        let response = self
            .http
            .get(format!("{}/proposals/claim", self.base_url))
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let job = expect_ok(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Request(format!("invalid claim response: {e}")))?;
        Ok(Some(job))
    }

    /// POST /proposals/{id}/mark_processed
    pub async fn mark_processed(
        &self,
        proposal_id: i64,
        candidates: &Candidates,
    ) -> Result<ProposalState, ClientError> {
        let response = self
            .http
            .post(format!(
                "{}/proposals/{proposal_id}/mark_processed",
                self.base_url
            ))
            .json(candidates)
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;
        expect_ok(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Request(format!("invalid mark_processed response: {e}")))
    }

    /// POST /proposals/{id}/mark_failed
    pub async fn mark_failed(
        &self,
        proposal_id: i64,
        error_message: &str,
    ) -> Result<ProposalState, ClientError> {
        let response = self
            .http
            .post(format!(
                "{}/proposals/{proposal_id}/mark_failed",
                self.base_url
            ))
            .json(&serde_json::json!({ "msg": error_message }))
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;
        expect_ok(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Request(format!("invalid mark_failed response: {e}")))
    }
}

/// Turn a non-2xx response into a `ClientError` carrying the body.
async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::UnexpectedResponse { status, body })
}
