//! libSQL proposal store — document-style persistence.
//!
//! Each proposal is one row: the full record as a JSON `doc` column,
//! with `state` denormalized for queries and claim CAS. Ids come from
//! the integer autoincrement key and are never reused.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database, params};
use tracing::{debug, info};

use crate::domain::{Proposal, ProposalState};
use crate::error::StoreError;
use crate::store::traits::ProposalStore;

/// libSQL-backed proposal store.
///
/// A single connection is reused for all operations;
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<Database>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create database directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Proposal store opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS proposals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    state TEXT NOT NULL,
                    doc TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    last_updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_proposals_state ON proposals(state);",
            )
            .await
            .map_err(|e| StoreError::Query(format!("init_schema: {e}")))?;
        Ok(())
    }
}

/// Serialize a proposal for the `doc` column.
fn to_doc(proposal: &Proposal) -> Result<String, StoreError> {
    serde_json::to_string(proposal).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Map a `(id, doc)` row back to a proposal.
///
/// The id column is authoritative; whatever id the doc carried is
/// overwritten.
fn row_to_proposal(row: &libsql::Row) -> Result<Proposal, StoreError> {
    let id: i64 = row
        .get(0)
        .map_err(|e| StoreError::Query(format!("row id: {e}")))?;
    let doc: String = row
        .get(1)
        .map_err(|e| StoreError::Query(format!("row doc: {e}")))?;
    let mut proposal: Proposal =
        serde_json::from_str(&doc).map_err(|e| StoreError::Serialization(e.to_string()))?;
    proposal.id = Some(id);
    Ok(proposal)
}

#[async_trait]
impl ProposalStore for LibSqlStore {
    async fn insert(&self, proposal: &Proposal) -> Result<i64, StoreError> {
        let doc = to_doc(proposal)?;
        self.conn()
            .execute(
                "INSERT INTO proposals (state, doc, created_at, last_updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    proposal.state.as_str(),
                    doc,
                    proposal.created_at.to_rfc3339(),
                    proposal.last_updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("insert: {e}")))?;

        let id = self.conn().last_insert_rowid();
        debug!(proposal_id = id, "Proposal inserted");
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<Proposal>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, doc FROM proposals WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("get row: {e}")))?
        {
            Some(row) => Ok(Some(row_to_proposal(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_first_in_state(
        &self,
        state: ProposalState,
    ) -> Result<Option<Proposal>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, doc FROM proposals WHERE state = ?1 ORDER BY id LIMIT 1",
                params![state.as_str()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("find_first_in_state: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("find_first_in_state row: {e}")))?
        {
            Some(row) => Ok(Some(row_to_proposal(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_if_state(
        &self,
        id: i64,
        expected: ProposalState,
        updated: &Proposal,
    ) -> Result<bool, StoreError> {
        let doc = to_doc(updated)?;
        let changed = self
            .conn()
            .execute(
                "UPDATE proposals SET state = ?1, doc = ?2, last_updated_at = ?3
                 WHERE id = ?4 AND state = ?5",
                params![
                    updated.state.as_str(),
                    doc,
                    updated.last_updated_at.to_rfc3339(),
                    id,
                    expected.as_str(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("update_if_state: {e}")))?;
        Ok(changed == 1)
    }

    async fn update(&self, id: i64, updated: &Proposal) -> Result<(), StoreError> {
        let doc = to_doc(updated)?;
        self.conn()
            .execute(
                "UPDATE proposals SET state = ?1, doc = ?2, last_updated_at = ?3 WHERE id = ?4",
                params![
                    updated.state.as_str(),
                    doc,
                    updated.last_updated_at.to_rfc3339(),
                    id,
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("update: {e}")))?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Proposal>, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT id, doc FROM proposals ORDER BY id", ())
            .await
            .map_err(|e| StoreError::Query(format!("list: {e}")))?;

        let mut proposals = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("list row: {e}")))?
        {
            proposals.push(row_to_proposal(&row)?);
        }
        Ok(proposals)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{Domain, ProposalRequest, StrategySpec, Variable};

    fn request() -> ProposalRequest {
        ProposalRequest {
            strategy_data: StrategySpec::Random {
                domain: Domain {
                    inputs: vec![Variable::continuous("x", 0.0, 1.0)],
                    outputs: vec![Variable::continuous("y", -10.0, 10.0)],
                },
                seed: None,
            },
            n_candidates: 2,
            experiments: None,
            pendings: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let p = Proposal::from_request(request(), Utc::now());
        let a = store.insert(&p).await.unwrap();
        let b = store.insert(&p).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn get_roundtrip() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let p = Proposal::from_request(request(), Utc::now());
        let id = store.insert(&p).await.unwrap();

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, Some(id));
        assert_eq!(loaded.state, ProposalState::Created);
        assert_eq!(loaded.n_candidates, 2);
        assert!(store.get(id + 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_first_returns_oldest_created() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let p = Proposal::from_request(request(), Utc::now());
        let first = store.insert(&p).await.unwrap();
        store.insert(&p).await.unwrap();

        let found = store
            .find_first_in_state(ProposalState::Created)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, Some(first));
        assert!(
            store
                .find_first_in_state(ProposalState::Claimed)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn update_if_state_is_conditional() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let p = Proposal::from_request(request(), Utc::now());
        let id = store.insert(&p).await.unwrap();

        let mut claimed = store.get(id).await.unwrap().unwrap();
        claimed.state = ProposalState::Claimed;
        claimed.last_updated_at = Utc::now();

        // First CAS wins, second observes the changed state and no-ops.
        assert!(
            store
                .update_if_state(id, ProposalState::Created, &claimed)
                .await
                .unwrap()
        );
        assert!(
            !store
                .update_if_state(id, ProposalState::Created, &claimed)
                .await
                .unwrap()
        );

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.state, ProposalState::Claimed);
    }

    #[tokio::test]
    async fn update_if_state_on_unknown_id_is_noop() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let p = Proposal::from_request(request(), Utc::now());
        assert!(
            !store
                .update_if_state(42, ProposalState::Created, &p)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("candidates.db");
        let store = LibSqlStore::new_local(&db_path).await.unwrap();
        assert!(db_path.exists());
        drop(store);
    }
}
