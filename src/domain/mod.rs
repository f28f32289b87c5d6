//! Data model: domains, data tables, proposals, and strategy specs.

mod proposal;
mod schema;
mod strategy;
mod table;

pub use proposal::{ClaimedJob, Proposal, ProposalRequest, ProposalState};
pub use schema::{Bounds, Domain, DomainError, Scalar, Variable};
pub use strategy::StrategySpec;
pub use table::{CandidateRow, Candidates, ExperimentRow, Experiments};
