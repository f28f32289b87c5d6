//! Error types for the candidates API.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Proposal error: {0}")]
    Proposal(#[from] ProposalError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Proposal store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Proposal lifecycle errors, surfaced to API callers.
#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    #[error("Proposal not found")]
    NotFound,

    #[error("Candidates not found")]
    CandidatesNotFound,

    #[error("Expected {expected} candidates, got {got}")]
    CandidateCountMismatch { expected: usize, got: usize },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Faults raised by strategy execution.
///
/// `InsufficientExperiments` is a recognized sentinel: the generate and
/// worker paths treat it as data depletion, not a generic server failure.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("Not enough experiments available to execute the strategy.")]
    InsufficientExperiments,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Strategy execution failed: {0}")]
    Execution(String),
}

/// Worker-side HTTP client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Could not connect to {url}.")]
    Unreachable { url: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
