//! Strategy configuration: a closed tagged union, one variant per
//! supported strategy kind. Opaque to the proposal lifecycle; only the
//! strategy layer interprets it.

use serde::{Deserialize, Serialize};

use super::schema::Domain;

/// Configuration of an optimization strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    /// Uniform random sampling over the domain. Needs no prior data.
    Random {
        domain: Domain,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
    /// Single-objective surrogate optimization. Requires prior experiments.
    Sobo { domain: Domain },
}

impl StrategySpec {
    /// The domain this strategy's data tables must conform to.
    pub fn domain(&self) -> &Domain {
        match self {
            StrategySpec::Random { domain, .. } => domain,
            StrategySpec::Sobo { domain } => domain,
        }
    }
}
