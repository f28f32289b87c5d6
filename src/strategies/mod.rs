//! Strategy execution: the `tell`/`ask` contract and the closed
//! dispatch from a [`StrategySpec`] to a concrete implementation.

mod random;
mod sobo;

pub use random::RandomStrategy;
pub use sobo::SoboStrategy;

use crate::domain::{Candidates, Experiments, StrategySpec};
use crate::error::StrategyError;

/// A candidate-generating optimization strategy.
///
/// Implementations consume prior observations through `tell` and produce
/// new candidate points through `ask`. The proposal lifecycle never
/// looks inside; it only moves tables across this boundary.
pub trait Strategy: Send {
    /// Feed prior observations to the strategy.
    fn tell(&mut self, experiments: &Experiments) -> Result<(), StrategyError>;

    /// Inform the strategy of in-flight candidates it should avoid
    /// re-proposing. Optional; the default ignores them.
    fn tell_pendings(&mut self, _pendings: &Candidates) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Generate exactly `n_candidates` new points.
    fn ask(&mut self, n_candidates: usize) -> Result<Candidates, StrategyError>;
}

/// Map a strategy spec to its implementation.
pub fn map(spec: &StrategySpec) -> Box<dyn Strategy> {
    match spec {
        StrategySpec::Random { domain, seed } => {
            Box::new(RandomStrategy::new(domain.clone(), *seed))
        }
        StrategySpec::Sobo { domain } => Box::new(SoboStrategy::new(domain.clone())),
    }
}

/// Run one full strategy invocation: map, tell, ask.
///
/// This is the body executed inside the sandbox for proposals, and
/// in-request for synchronous generation.
pub fn propose(
    spec: &StrategySpec,
    experiments: Option<&Experiments>,
    pendings: Option<&Candidates>,
    n_candidates: usize,
) -> Result<Candidates, StrategyError> {
    let mut strategy = map(spec);
    if let Some(experiments) = experiments {
        strategy.tell(experiments)?;
    }
    if let Some(pendings) = pendings {
        strategy.tell_pendings(pendings)?;
    }
    strategy.ask(n_candidates)
}
