//! The proposal record and its lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::strategy::StrategySpec;
use super::table::{Candidates, Experiments};

/// Lifecycle state of a proposal.
///
/// `Finished` and `Failed` are terminal; a proposal is never re-claimed
/// once it leaves `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalState {
    Created,
    Claimed,
    Finished,
    Failed,
}

impl ProposalState {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Finished | ProposalState::Failed)
    }

    /// Stable string form, used as the denormalized store column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalState::Created => "CREATED",
            ProposalState::Claimed => "CLAIMED",
            ProposalState::Finished => "FINISHED",
            ProposalState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ProposalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client request to create a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub strategy_data: StrategySpec,
    #[serde(default = "default_n_candidates")]
    pub n_candidates: usize,
    #[serde(default)]
    pub experiments: Option<Experiments>,
    #[serde(default)]
    pub pendings: Option<Candidates>,
}

fn default_n_candidates() -> usize {
    1
}

/// One optimization job record, tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Assigned by the store on insert; `None` only before insertion.
    pub id: Option<i64>,
    pub strategy_data: StrategySpec,
    pub n_candidates: usize,
    #[serde(default)]
    pub experiments: Option<Experiments>,
    #[serde(default)]
    pub pendings: Option<Candidates>,
    /// Set exactly when `state == Finished`.
    #[serde(default)]
    pub candidates: Option<Candidates>,
    pub state: ProposalState,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    /// Set exactly when `state == Failed`.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Proposal {
    /// Build a fresh proposal from a request, in `Created` state.
    pub fn from_request(request: ProposalRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            strategy_data: request.strategy_data,
            n_candidates: request.n_candidates,
            experiments: request.experiments,
            pendings: request.pendings,
            candidates: None,
            state: ProposalState::Created,
            created_at: now,
            last_updated_at: now,
            error_message: None,
        }
    }
}

/// The claim response tuple: `(id, strategy_data, n_candidates,
/// experiments, pendings)`. Serializes as a 5-element JSON array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedJob(
    pub i64,
    pub StrategySpec,
    pub usize,
    pub Option<Experiments>,
    pub Option<Candidates>,
);

impl ClaimedJob {
    pub fn id(&self) -> i64 {
        self.0
    }

    pub fn strategy_data(&self) -> &StrategySpec {
        &self.1
    }

    pub fn n_candidates(&self) -> usize {
        self.2
    }
}
