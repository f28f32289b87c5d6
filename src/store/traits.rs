//! `ProposalStore` trait — async interface for proposal persistence.

use async_trait::async_trait;

use crate::domain::{Proposal, ProposalState};
use crate::error::StoreError;

/// Backend-agnostic proposal store.
///
/// Records are keyed by a store-assigned integer id. `update_if_state`
/// is the only conditional primitive; it is what makes claiming a
/// proposal race-safe across concurrent callers.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Persist a new proposal and return its assigned id.
    ///
    /// Any id already set on `proposal` is ignored.
    async fn insert(&self, proposal: &Proposal) -> Result<i64, StoreError>;

    /// Fetch a proposal by id.
    async fn get(&self, id: i64) -> Result<Option<Proposal>, StoreError>;

    /// Find the oldest proposal in the given state, if any.
    async fn find_first_in_state(
        &self,
        state: ProposalState,
    ) -> Result<Option<Proposal>, StoreError>;

    /// Atomically replace the record only if its current state still
    /// equals `expected`. Returns false (no write) if the precondition
    /// fails or the id is unknown.
    async fn update_if_state(
        &self,
        id: i64,
        expected: ProposalState,
        updated: &Proposal,
    ) -> Result<bool, StoreError>;

    /// Unconditionally replace the record. Used by the report path,
    /// which is serialized by the single worker holding the claim.
    async fn update(&self, id: i64, updated: &Proposal) -> Result<(), StoreError>;

    /// All proposals, in id order.
    async fn list(&self) -> Result<Vec<Proposal>, StoreError>;
}
