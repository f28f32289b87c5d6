//! Row-oriented data tables exchanged with strategies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::Scalar;

/// One proposed input point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    pub inputs: BTreeMap<String, Scalar>,
}

/// A table of proposed input points, schema-bound to a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidates {
    pub rows: Vec<CandidateRow>,
}

impl Candidates {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One observed input/output point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRow {
    pub inputs: BTreeMap<String, Scalar>,
    pub outputs: BTreeMap<String, f64>,
}

/// A table of previously observed points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiments {
    pub rows: Vec<ExperimentRow>,
}

impl Experiments {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
