//! Single-objective surrogate strategy.
//!
//! A deliberately small stand-in for a Bayesian optimizer: it keeps the
//! told experiments, takes the best observed point on the first declared
//! output (minimization), and proposes candidates in a shrunken
//! neighborhood around it. What matters for the lifecycle is the
//! contract: it refuses to run without prior data.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{
    Bounds, CandidateRow, Candidates, Domain, ExperimentRow, Experiments, Scalar,
};
use crate::error::StrategyError;
use crate::strategies::Strategy;

/// Fraction of each continuous range used as the search neighborhood.
const NEIGHBORHOOD: f64 = 0.1;

pub struct SoboStrategy {
    domain: Domain,
    observed: Vec<ExperimentRow>,
    rng: StdRng,
}

impl SoboStrategy {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            observed: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Best observed row by the first declared output (lower is better).
    fn incumbent(&self) -> Option<&ExperimentRow> {
        let objective = &self.domain.outputs.first()?.name;
        self.observed
            .iter()
            .filter(|row| row.outputs.get(objective).is_some_and(|y| y.is_finite()))
            .min_by(|a, b| {
                let ya = a.outputs[objective];
                let yb = b.outputs[objective];
                ya.total_cmp(&yb)
            })
    }
}

/// Propose a value close to `current`, clipped to the variable's bounds.
fn perturb(rng: &mut StdRng, var_bounds: &Bounds, current: Option<&Scalar>) -> Scalar {
    match var_bounds {
        Bounds::Continuous { lower, upper } => {
            let center = match current {
                Some(Scalar::Number(x)) => *x,
                _ => (lower + upper) / 2.0,
            };
            let width = (upper - lower) * NEIGHBORHOOD;
            let lo = (center - width).max(*lower);
            let hi = (center + width).min(*upper);
            Scalar::Number(if hi > lo { rng.gen_range(lo..=hi) } else { lo })
        }
        Bounds::Discrete { values } => match current {
            Some(s @ Scalar::Number(_)) if !values.is_empty() => s.clone(),
            _ => Scalar::Number(values.first().copied().unwrap_or(0.0)),
        },
        Bounds::Categorical { categories } => match current {
            Some(s @ Scalar::Text(_)) => s.clone(),
            _ => Scalar::Text(categories.first().cloned().unwrap_or_default()),
        },
    }
}

impl Strategy for SoboStrategy {
    fn tell(&mut self, experiments: &Experiments) -> Result<(), StrategyError> {
        self.domain
            .validate_experiments(experiments)
            .map_err(|e| StrategyError::Validation(e.to_string()))?;
        self.observed.extend(experiments.rows.iter().cloned());
        Ok(())
    }

    fn ask(&mut self, n_candidates: usize) -> Result<Candidates, StrategyError> {
        if self.observed.is_empty() {
            return Err(StrategyError::InsufficientExperiments);
        }
        if self.domain.outputs.is_empty() {
            return Err(StrategyError::Validation(
                "sobo requires at least one output variable".to_string(),
            ));
        }
        let best = self
            .incumbent()
            .ok_or(StrategyError::InsufficientExperiments)?
            .inputs
            .clone();

        let mut rows = Vec::with_capacity(n_candidates);
        for _ in 0..n_candidates {
            let mut inputs = BTreeMap::new();
            for var in &self.domain.inputs {
                let value = perturb(&mut self.rng, &var.bounds, best.get(&var.name));
                inputs.insert(var.name.clone(), value);
            }
            rows.push(CandidateRow { inputs });
        }
        Ok(Candidates { rows })
    }
}
