//! Feature extraction: raw email text → normalized text → term weights, plus raw-text
//! heuristics, concatenated into one sparse row in fixed column order.

mod heuristics;
mod normalize;
mod pipeline;
mod vectorizer;

pub use heuristics::{extract_features, HeuristicFeatures, URGENCY_KEYWORDS};
pub use normalize::normalize;
pub use pipeline::FeatureExtractor;
pub use vectorizer::{vectorize, Norm, TermEntry, Tokenizer, VocabularyArtifact, VocabularyTable};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Heuristic columns in the exact order they follow the vocabulary columns.
pub const HEURISTIC_SCHEMA: [&str; 3] = ["num_links", "num_obfuscated", "urgency_score"];

pub const HEURISTIC_COUNT: usize = HEURISTIC_SCHEMA.len();

/// Sparse numeric row. Entries are kept in ascending column order with no explicit zeros,
/// so any reduction over them visits columns in the same order on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SparseRow")]
pub struct SparseVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

/// Wire form of [`SparseVector`]; only reaches the public type through [`TryFrom`].
#[derive(Deserialize)]
struct SparseRow {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl TryFrom<SparseRow> for SparseVector {
    type Error = String;

    fn try_from(row: SparseRow) -> Result<Self, Self::Error> {
        let mut prev: Option<usize> = None;
        for &(col, _) in &row.entries {
            if col >= row.dim {
                return Err(format!("column {col} out of range for dim {}", row.dim));
            }
            if prev.is_some_and(|p| col <= p) {
                return Err(format!("column {col} is not in ascending order"));
            }
            prev = Some(col);
        }
        Ok(Self::from_sorted(row.dim, row.entries.into_iter()))
    }
}

/// Full classifier input: `V` term columns followed by the heuristic columns.
pub type FeatureVector = SparseVector;

impl SparseVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    /// Build from arbitrary `(column, value)` pairs. Values for a repeated column are summed.
    /// Returns `None` if any column is out of range.
    pub fn from_entries(
        dim: usize,
        entries: impl IntoIterator<Item = (usize, f64)>,
    ) -> Option<Self> {
        let mut acc = std::collections::BTreeMap::new();
        for (col, value) in entries {
            if col >= dim {
                return None;
            }
            *acc.entry(col).or_insert(0.0) += value;
        }
        Some(Self::from_sorted(dim, acc.into_iter()))
    }

    /// Caller guarantees ascending, in-range columns.
    pub(crate) fn from_sorted(dim: usize, entries: impl Iterator<Item = (usize, f64)>) -> Self {
        Self {
            dim,
            entries: entries.filter(|(_, v)| *v != 0.0).collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored non-zero entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, col: usize) -> f64 {
        self.entries
            .binary_search_by_key(&col, |(c, _)| *c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_dense(&self) -> Array1<f64> {
        let mut out = Array1::zeros(self.dim);
        for &(col, value) in &self.entries {
            out[col] = value;
        }
        out
    }

    /// Append `tail` after this vector's columns.
    pub fn concat(&self, tail: &SparseVector) -> SparseVector {
        let offset = self.dim;
        SparseVector {
            dim: self.dim + tail.dim,
            entries: self
                .entries
                .iter()
                .copied()
                .chain(tail.entries.iter().map(|&(c, v)| (c + offset, v)))
                .collect(),
        }
    }
}
