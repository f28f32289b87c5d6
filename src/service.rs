//! Proposal lifecycle service.
//!
//! Enforces the CREATED → CLAIMED → FINISHED | FAILED state machine over
//! an injected [`ProposalStore`]. The claim transition is the only one
//! contended across callers; it goes through the store's conditional
//! update and retries on a lost race.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{
    Candidates, ClaimedJob, Proposal, ProposalRequest, ProposalState,
};
use crate::error::{ProposalError, StoreError};
use crate::store::ProposalStore;

pub struct ProposalService {
    store: Arc<dyn ProposalStore>,
}

impl ProposalService {
    pub fn new(store: Arc<dyn ProposalStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new proposal in `Created` state.
    pub async fn create(&self, request: ProposalRequest) -> Result<Proposal, ProposalError> {
        if request.n_candidates == 0 {
            return Err(ProposalError::Validation(
                "n_candidates must be greater than 0".to_string(),
            ));
        }
        let domain = request.strategy_data.domain();
        if let Some(experiments) = &request.experiments {
            domain
                .validate_experiments(experiments)
                .map_err(|e| ProposalError::Validation(format!("experiments: {e}")))?;
        }
        if let Some(pendings) = &request.pendings {
            domain
                .validate_candidates(pendings)
                .map_err(|e| ProposalError::Validation(format!("pendings: {e}")))?;
        }

        let mut proposal = Proposal::from_request(request, Utc::now());
        let id = self.store.insert(&proposal).await?;
        proposal.id = Some(id);
        info!(proposal_id = id, "Proposal created");
        Ok(proposal)
    }

    /// Claim the oldest `Created` proposal, if any.
    ///
    /// Exactly one of any set of concurrent callers wins a given record;
    /// losers retry against the next candidate record. `Ok(None)` means
    /// the queue is empty — a normal condition, not an error.
    pub async fn claim(&self) -> Result<Option<ClaimedJob>, ProposalError> {
        loop {
            let Some(proposal) = self.store.find_first_in_state(ProposalState::Created).await?
            else {
                return Ok(None);
            };
            // A stored record always carries its assigned id; anything
            // else is a store-contract violation, not a claimable row.
            let Some(id) = proposal.id else {
                return Err(ProposalError::Store(StoreError::Query(
                    "claim: record without an id".to_string(),
                )));
            };

            let mut claimed = proposal.clone();
            claimed.state = ProposalState::Claimed;
            claimed.last_updated_at = Utc::now();

            if self
                .store
                .update_if_state(id, ProposalState::Created, &claimed)
                .await?
            {
                info!(proposal_id = id, "Proposal claimed");
                return Ok(Some(ClaimedJob(
                    id,
                    claimed.strategy_data,
                    claimed.n_candidates,
                    claimed.experiments,
                    claimed.pendings,
                )));
            }
            // Lost the race; some other caller claimed it first.
            debug!(proposal_id = id, "Claim raced, retrying");
        }
    }

    pub async fn get(&self, id: i64) -> Result<Proposal, ProposalError> {
        self.store.get(id).await?.ok_or(ProposalError::NotFound)
    }

    pub async fn get_state(&self, id: i64) -> Result<ProposalState, ProposalError> {
        Ok(self.get(id).await?.state)
    }

    /// Result candidates of a finished proposal.
    pub async fn get_candidates(&self, id: i64) -> Result<Candidates, ProposalError> {
        self.get(id)
            .await?
            .candidates
            .ok_or(ProposalError::CandidatesNotFound)
    }

    /// Record a successful outcome: attach candidates, move to `Finished`.
    /// Terminal records reject further reports.
    pub async fn mark_processed(
        &self,
        id: i64,
        candidates: Candidates,
    ) -> Result<ProposalState, ProposalError> {
        let mut proposal = self.get(id).await?;
        if proposal.state.is_terminal() {
            return Err(ProposalError::Validation(format!(
                "proposal is already {}",
                proposal.state
            )));
        }
        if candidates.len() != proposal.n_candidates {
            return Err(ProposalError::CandidateCountMismatch {
                expected: proposal.n_candidates,
                got: candidates.len(),
            });
        }
        proposal
            .strategy_data
            .domain()
            .validate_candidates(&candidates)
            .map_err(|e| ProposalError::Validation(format!("candidates: {e}")))?;

        proposal.candidates = Some(candidates);
        proposal.state = ProposalState::Finished;
        proposal.last_updated_at = Utc::now();
        self.store.update(id, &proposal).await?;
        info!(proposal_id = id, "Proposal finished");
        Ok(proposal.state)
    }

    /// Record a failed outcome: attach the error message, move to `Failed`.
    /// Terminal records reject further reports.
    pub async fn mark_failed(
        &self,
        id: i64,
        error_message: String,
    ) -> Result<ProposalState, ProposalError> {
        let mut proposal = self.get(id).await?;
        if proposal.state.is_terminal() {
            return Err(ProposalError::Validation(format!(
                "proposal is already {}",
                proposal.state
            )));
        }
        proposal.error_message = Some(error_message);
        proposal.state = ProposalState::Failed;
        proposal.last_updated_at = Utc::now();
        self.store.update(id, &proposal).await?;
        info!(proposal_id = id, "Proposal failed");
        Ok(proposal.state)
    }

    pub async fn list(&self) -> Result<Vec<Proposal>, ProposalError> {
        Ok(self.store.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::{CandidateRow, Domain, Scalar, StrategySpec, Variable};
    use crate::store::LibSqlStore;

    async fn service() -> ProposalService {
        let store = LibSqlStore::new_memory().await.unwrap();
        ProposalService::new(Arc::new(store))
    }

    fn domain() -> Domain {
        Domain {
            inputs: vec![Variable::continuous("x", 0.0, 1.0)],
            outputs: vec![Variable::continuous("y", -100.0, 100.0)],
        }
    }

    fn request(n_candidates: usize) -> ProposalRequest {
        ProposalRequest {
            strategy_data: StrategySpec::Random {
                domain: domain(),
                seed: None,
            },
            n_candidates,
            experiments: None,
            pendings: None,
        }
    }

    fn candidates(n: usize) -> Candidates {
        let rows = (0..n)
            .map(|i| {
                let mut inputs = BTreeMap::new();
                inputs.insert(
                    "x".to_string(),
                    Scalar::Number(i as f64 / n.max(1) as f64),
                );
                CandidateRow { inputs }
            })
            .collect();
        Candidates { rows }
    }

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let svc = service().await;
        let a = svc.create(request(1)).await.unwrap();
        let b = svc.create(request(1)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.state, ProposalState::Created);
    }

    #[tokio::test]
    async fn create_rejects_zero_candidates() {
        let svc = service().await;
        assert!(matches!(
            svc.create(request(0)).await,
            Err(ProposalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn create_rejects_bad_experiments() {
        let svc = service().await;
        let mut req = request(1);
        req.experiments = Some(crate::domain::Experiments {
            rows: vec![crate::domain::ExperimentRow {
                inputs: BTreeMap::new(), // missing "x"
                outputs: BTreeMap::new(),
            }],
        });
        assert!(matches!(
            svc.create(req).await,
            Err(ProposalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn claim_transitions_to_claimed() {
        let svc = service().await;
        let created = svc.create(request(3)).await.unwrap();

        let job = svc.claim().await.unwrap().unwrap();
        assert_eq!(Some(job.id()), created.id);
        assert_eq!(job.n_candidates(), 3);

        let state = svc.get_state(job.id()).await.unwrap();
        assert_eq!(state, ProposalState::Claimed);

        // Queue drained.
        assert!(svc.claim().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_on_empty_queue_is_none() {
        let svc = service().await;
        assert!(svc.claim().await.unwrap().is_none());
    }

    /// Store that hands out records without ids, violating the contract.
    struct IdLessStore;

    #[async_trait::async_trait]
    impl ProposalStore for IdLessStore {
        async fn insert(&self, _proposal: &Proposal) -> Result<i64, StoreError> {
            Ok(1)
        }

        async fn get(&self, _id: i64) -> Result<Option<Proposal>, StoreError> {
            Ok(None)
        }

        async fn find_first_in_state(
            &self,
            _state: ProposalState,
        ) -> Result<Option<Proposal>, StoreError> {
            Ok(Some(Proposal::from_request(request(1), Utc::now())))
        }

        async fn update_if_state(
            &self,
            _id: i64,
            _expected: ProposalState,
            _updated: &Proposal,
        ) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn update(&self, _id: i64, _updated: &Proposal) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list(&self) -> Result<Vec<Proposal>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn claim_rejects_records_without_ids() {
        let svc = ProposalService::new(Arc::new(IdLessStore));
        assert!(matches!(
            svc.claim().await,
            Err(ProposalError::Store(StoreError::Query(_)))
        ));
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let svc = Arc::new(service().await);
        svc.create(request(1)).await.unwrap();

        let attempts = (0..8).map(|_| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.claim().await.unwrap() })
        });
        let results = futures::future::join_all(attempts).await;
        let winners = results
            .into_iter()
            .filter(|r| r.as_ref().unwrap().is_some())
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn mark_processed_sets_finished_and_candidates() {
        let svc = service().await;
        let created = svc.create(request(2)).await.unwrap();
        let id = created.id.unwrap();
        svc.claim().await.unwrap();

        let table = candidates(2);
        let state = svc.mark_processed(id, table.clone()).await.unwrap();
        assert_eq!(state, ProposalState::Finished);

        let loaded = svc.get_candidates(id).await.unwrap();
        assert_eq!(loaded, table);

        // Terminal state stays fixed under repeated reads.
        assert_eq!(svc.get_state(id).await.unwrap(), ProposalState::Finished);
        assert_eq!(svc.get_candidates(id).await.unwrap(), table);
    }

    #[tokio::test]
    async fn mark_processed_rejects_count_mismatch() {
        let svc = service().await;
        let created = svc.create(request(1)).await.unwrap();
        let id = created.id.unwrap();

        assert!(matches!(
            svc.mark_processed(id, candidates(5)).await,
            Err(ProposalError::CandidateCountMismatch {
                expected: 1,
                got: 5
            })
        ));
        // Record untouched.
        assert_eq!(svc.get_state(id).await.unwrap(), ProposalState::Created);
    }

    #[tokio::test]
    async fn pendings_pass_through_to_the_claim() {
        let svc = service().await;
        let mut req = request(1);
        req.pendings = Some(candidates(2));
        svc.create(req).await.unwrap();

        let job = svc.claim().await.unwrap().unwrap();
        assert_eq!(job.4, Some(candidates(2)));
    }

    #[tokio::test]
    async fn create_rejects_pendings_missing_an_input() {
        let svc = service().await;
        let mut req = request(1);
        req.pendings = Some(Candidates {
            rows: vec![CandidateRow {
                inputs: BTreeMap::new(), // missing "x"
            }],
        });
        assert!(matches!(
            svc.create(req).await,
            Err(ProposalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn terminal_proposals_reject_further_reports() {
        let svc = service().await;
        let id = svc.create(request(1)).await.unwrap().id.unwrap();
        svc.claim().await.unwrap();
        svc.mark_processed(id, candidates(1)).await.unwrap();

        // Finished is final: neither report path may touch the record.
        assert!(matches!(
            svc.mark_failed(id, "late".to_string()).await,
            Err(ProposalError::Validation(_))
        ));
        assert!(matches!(
            svc.mark_processed(id, candidates(1)).await,
            Err(ProposalError::Validation(_))
        ));
        assert_eq!(svc.get_state(id).await.unwrap(), ProposalState::Finished);
        assert!(svc.get_candidates(id).await.is_ok());

        let failed = svc.create(request(1)).await.unwrap().id.unwrap();
        svc.mark_failed(failed, "boom".to_string()).await.unwrap();
        assert!(matches!(
            svc.mark_processed(failed, candidates(1)).await,
            Err(ProposalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn mark_failed_records_message() {
        let svc = service().await;
        let id = svc.create(request(1)).await.unwrap().id.unwrap();

        let state = svc.mark_failed(id, "boom".to_string()).await.unwrap();
        assert_eq!(state, ProposalState::Failed);

        let loaded = svc.get(id).await.unwrap();
        assert_eq!(loaded.error_message.as_deref(), Some("boom"));
        assert!(loaded.candidates.is_none());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let svc = service().await;
        assert!(matches!(svc.get(99).await, Err(ProposalError::NotFound)));
        assert!(matches!(
            svc.get_state(99).await,
            Err(ProposalError::NotFound)
        ));
        assert!(matches!(
            svc.get_candidates(99).await,
            Err(ProposalError::NotFound)
        ));
        assert!(matches!(
            svc.mark_processed(99, candidates(1)).await,
            Err(ProposalError::NotFound)
        ));
        assert!(matches!(
            svc.mark_failed(99, "x".to_string()).await,
            Err(ProposalError::NotFound)
        ));
    }

    #[tokio::test]
    async fn candidates_unavailable_before_finish() {
        let svc = service().await;
        let id = svc.create(request(1)).await.unwrap().id.unwrap();
        assert!(matches!(
            svc.get_candidates(id).await,
            Err(ProposalError::CandidatesNotFound)
        ));
    }

    #[tokio::test]
    async fn list_returns_all() {
        let svc = service().await;
        svc.create(request(1)).await.unwrap();
        svc.create(request(1)).await.unwrap();
        assert_eq!(svc.list().await.unwrap().len(), 2);
    }
}
