//! Domain schema: the input/output variables a strategy and its data
//! tables must conform to.

use serde::{Deserialize, Serialize};

use super::table::{Candidates, Experiments};

/// A single cell value in a data table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

/// Valid value range of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Bounds {
    Continuous { lower: f64, upper: f64 },
    Discrete { values: Vec<f64> },
    Categorical { categories: Vec<String> },
}

/// A named input or output variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(flatten)]
    pub bounds: Bounds,
}

impl Variable {
    pub fn continuous(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            bounds: Bounds::Continuous { lower, upper },
        }
    }

    pub fn discrete(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            bounds: Bounds::Discrete { values },
        }
    }

    pub fn categorical(name: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Bounds::Categorical { categories },
        }
    }

    /// Check a cell value against this variable's bounds.
    fn check(&self, row: usize, value: &Scalar) -> Result<(), DomainError> {
        let violation = |message: String| DomainError::OutOfDomain {
            row,
            name: self.name.clone(),
            message,
        };
        match (&self.bounds, value) {
            (Bounds::Continuous { lower, upper }, Scalar::Number(x)) => {
                if x < lower || x > upper {
                    return Err(violation(format!("{x} outside [{lower}, {upper}]")));
                }
            }
            (Bounds::Discrete { values }, Scalar::Number(x)) => {
                if !values.contains(x) {
                    return Err(violation(format!("{x} not one of the allowed values")));
                }
            }
            (Bounds::Categorical { categories }, Scalar::Text(s)) => {
                if !categories.contains(s) {
                    return Err(violation(format!("{s:?} not one of the allowed categories")));
                }
            }
            (Bounds::Categorical { .. }, Scalar::Number(_)) => {
                return Err(violation("expected a category, got a number".to_string()));
            }
            (_, Scalar::Text(_)) => {
                return Err(violation("expected a number, got a string".to_string()));
            }
        }
        Ok(())
    }
}

/// Row validation failures.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("row {row}: missing value for input {name}")]
    MissingInput { row: usize, name: String },

    #[error("row {row}: missing value for output {name}")]
    MissingOutput { row: usize, name: String },

    #[error("row {row}: invalid value for {name}: {message}")]
    OutOfDomain {
        row: usize,
        name: String,
        message: String,
    },
}

/// The schema describing the variables a strategy operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub inputs: Vec<Variable>,
    pub outputs: Vec<Variable>,
}

impl Domain {
    /// Validate a candidates table: every row must carry a value for
    /// every declared input, within that input's bounds.
    pub fn validate_candidates(&self, candidates: &Candidates) -> Result<(), DomainError> {
        for (i, row) in candidates.rows.iter().enumerate() {
            for var in &self.inputs {
                let value = row.inputs.get(&var.name).ok_or(DomainError::MissingInput {
                    row: i,
                    name: var.name.clone(),
                })?;
                var.check(i, value)?;
            }
        }
        Ok(())
    }

    /// Validate an experiments table: rows must carry all inputs (within
    /// bounds) and all declared outputs.
    pub fn validate_experiments(&self, experiments: &Experiments) -> Result<(), DomainError> {
        for (i, row) in experiments.rows.iter().enumerate() {
            for var in &self.inputs {
                let value = row.inputs.get(&var.name).ok_or(DomainError::MissingInput {
                    row: i,
                    name: var.name.clone(),
                })?;
                var.check(i, value)?;
            }
            for var in &self.outputs {
                if !row.outputs.contains_key(&var.name) {
                    return Err(DomainError::MissingOutput {
                        row: i,
                        name: var.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::{CandidateRow, ExperimentRow};

    fn domain() -> Domain {
        Domain {
            inputs: vec![
                Variable::continuous("x1", 0.0, 1.0),
                Variable::categorical("cat", vec!["a".into(), "b".into()]),
            ],
            outputs: vec![Variable::continuous("y", f64::NEG_INFINITY, f64::INFINITY)],
        }
    }

    fn row(x1: f64, cat: &str) -> CandidateRow {
        let mut inputs = BTreeMap::new();
        inputs.insert("x1".to_string(), Scalar::Number(x1));
        inputs.insert("cat".to_string(), Scalar::Text(cat.to_string()));
        CandidateRow { inputs }
    }

    #[test]
    fn valid_candidates_pass() {
        let c = Candidates {
            rows: vec![row(0.5, "a"), row(1.0, "b")],
        };
        assert!(domain().validate_candidates(&c).is_ok());
    }

    #[test]
    fn missing_input_is_rejected() {
        let mut r = row(0.5, "a");
        r.inputs.remove("cat");
        let c = Candidates { rows: vec![r] };
        let err = domain().validate_candidates(&c).unwrap_err();
        assert!(matches!(err, DomainError::MissingInput { name, .. } if name == "cat"));
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let c = Candidates {
            rows: vec![row(1.5, "a")],
        };
        assert!(matches!(
            domain().validate_candidates(&c),
            Err(DomainError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let c = Candidates {
            rows: vec![row(0.5, "z")],
        };
        assert!(matches!(
            domain().validate_candidates(&c),
            Err(DomainError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn experiments_require_outputs() {
        let candidate = row(0.5, "a");
        let e = Experiments {
            rows: vec![ExperimentRow {
                inputs: candidate.inputs,
                outputs: BTreeMap::new(),
            }],
        };
        assert!(matches!(
            domain().validate_experiments(&e),
            Err(DomainError::MissingOutput { .. })
        ));
    }

    #[test]
    fn bounds_roundtrip_json() {
        let v = Variable::continuous("x", -1.0, 1.0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "continuous");
        let back: Variable = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
