//! Uniform random sampling over a domain.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bounds, CandidateRow, Candidates, Domain, Experiments, Scalar};
use crate::error::StrategyError;
use crate::strategies::Strategy;

/// Samples every input variable independently and uniformly.
pub struct RandomStrategy {
    domain: Domain,
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(domain: Domain, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { domain, rng }
    }
}

/// Draw one value uniformly from the given bounds.
fn sample(rng: &mut StdRng, bounds: &Bounds, name: &str) -> Result<Scalar, StrategyError> {
    match bounds {
        Bounds::Continuous { lower, upper } => {
            if upper < lower {
                return Err(StrategyError::Validation(format!(
                    "input {name}: empty continuous range"
                )));
            }
            Ok(Scalar::Number(rng.gen_range(*lower..=*upper)))
        }
        Bounds::Discrete { values } => {
            if values.is_empty() {
                return Err(StrategyError::Validation(format!(
                    "input {name}: no discrete values"
                )));
            }
            let i = rng.gen_range(0..values.len());
            Ok(Scalar::Number(values[i]))
        }
        Bounds::Categorical { categories } => {
            if categories.is_empty() {
                return Err(StrategyError::Validation(format!(
                    "input {name}: no categories"
                )));
            }
            let i = rng.gen_range(0..categories.len());
            Ok(Scalar::Text(categories[i].clone()))
        }
    }
}

impl Strategy for RandomStrategy {
    fn tell(&mut self, experiments: &Experiments) -> Result<(), StrategyError> {
        // Random sampling ignores history, but the rows must still fit the domain.
        self.domain
            .validate_experiments(experiments)
            .map_err(|e| StrategyError::Validation(e.to_string()))
    }

    fn ask(&mut self, n_candidates: usize) -> Result<Candidates, StrategyError> {
        let mut rows = Vec::with_capacity(n_candidates);
        for _ in 0..n_candidates {
            let mut inputs = BTreeMap::new();
            for var in &self.domain.inputs {
                inputs.insert(var.name.clone(), sample(&mut self.rng, &var.bounds, &var.name)?);
            }
            rows.push(CandidateRow { inputs });
        }
        Ok(Candidates { rows })
    }
}
