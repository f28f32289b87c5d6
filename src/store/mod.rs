//! Proposal persistence.

mod libsql_backend;
mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::ProposalStore;
