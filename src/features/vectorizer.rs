//! Vocabulary table and TF-IDF weighting of normalized text.

use super::SparseVector;
use crate::artifact::read_json;
use crate::error::ArtifactLoadError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

const ARTIFACT: &str = "vocabulary";

static WORD: OnceLock<Regex> = OnceLock::new();

/// How normalized text is split into vocabulary tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tokenizer {
    /// Runs of whitespace separate tokens.
    #[default]
    Whitespace,
    /// Word-character runs of length two or more (`\b\w\w+\b`).
    Word,
}

impl Tokenizer {
    fn tokens<'a>(self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self {
            Tokenizer::Whitespace => Box::new(text.split_whitespace()),
            Tokenizer::Word => {
                let re = WORD.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("word pattern"));
                Box::new(re.find_iter(text).map(|m| m.as_str()))
            }
        }
    }
}

/// Row normalization applied after idf weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Norm {
    #[default]
    None,
    L2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    pub token: String,
    pub index: usize,
    pub idf: f64,
}

/// On-disk vocabulary layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyArtifact {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tokenizer: Tokenizer,
    #[serde(default)]
    pub norm: Norm,
    pub terms: Vec<TermEntry>,
}

/// Immutable token → (column, idf) table. Columns are exactly `0..len()`.
#[derive(Debug, Clone)]
pub struct VocabularyTable {
    version: Option<String>,
    tokenizer: Tokenizer,
    norm: Norm,
    columns: HashMap<String, usize>,
    tokens: Vec<String>,
    idf: Vec<f64>,
}

impl VocabularyTable {
    pub fn load(path: &Path) -> Result<Self, ArtifactLoadError> {
        let artifact: VocabularyArtifact = read_json(path)?;
        let table = Self::from_artifact(artifact)?;
        tracing::info!(
            path = %path.display(),
            terms = table.len(),
            version = table.version.as_deref().unwrap_or("unversioned"),
            "vocabulary loaded"
        );
        Ok(table)
    }

    /// Validate column layout and weights.
    pub fn from_artifact(artifact: VocabularyArtifact) -> Result<Self, ArtifactLoadError> {
        let n = artifact.terms.len();
        if n == 0 {
            return Err(ArtifactLoadError::inconsistent(ARTIFACT, "no terms"));
        }

        let mut slots: Vec<Option<(String, f64)>> = vec![None; n];
        let mut columns = HashMap::with_capacity(n);
        for term in artifact.terms {
            if term.token.is_empty() || term.token.chars().any(char::is_whitespace) {
                return Err(ArtifactLoadError::inconsistent(
                    ARTIFACT,
                    format!("token {:?} at column {} can never match", term.token, term.index),
                ));
            }
            if !term.idf.is_finite() || term.idf < 0.0 {
                return Err(ArtifactLoadError::inconsistent(
                    ARTIFACT,
                    format!("token {:?} has invalid idf {}", term.token, term.idf),
                ));
            }
            if term.index >= n {
                return Err(ArtifactLoadError::inconsistent(
                    ARTIFACT,
                    format!("column {} outside 0..{} (index gap)", term.index, n),
                ));
            }
            if slots[term.index].is_some() {
                return Err(ArtifactLoadError::inconsistent(
                    ARTIFACT,
                    format!("column {} assigned twice", term.index),
                ));
            }
            if columns.insert(term.token.clone(), term.index).is_some() {
                return Err(ArtifactLoadError::inconsistent(
                    ARTIFACT,
                    format!("token {:?} listed twice", term.token),
                ));
            }
            slots[term.index] = Some((term.token, term.idf));
        }

        // n distinct in-range columns for n terms: no slot can be empty.
        let (tokens, idf): (Vec<String>, Vec<f64>) = slots.into_iter().flatten().unzip();

        Ok(Self {
            version: artifact.version,
            tokenizer: artifact.tokenizer,
            norm: artifact.norm,
            columns,
            tokens,
            idf,
        })
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Column and idf weight for `token`.
    pub fn lookup(&self, token: &str) -> Option<(usize, f64)> {
        self.columns.get(token).map(|&col| (col, self.idf[col]))
    }

    /// Hex SHA-256 over the tokens in column order, each followed by a NUL byte.
    pub fn digest(&self) -> String {
        let mut h = Sha256::new();
        for token in &self.tokens {
            h.update(token.as_bytes());
            h.update([0u8]);
        }
        format!("{:x}", h.finalize())
    }
}

/// Term-frequency × idf weights of `normalized` text, one column per vocabulary entry.
/// Out-of-vocabulary tokens contribute nothing.
pub fn vectorize(normalized: &str, vocabulary: &VocabularyTable) -> SparseVector {
    let mut tf: BTreeMap<usize, u32> = BTreeMap::new();
    for token in vocabulary.tokenizer.tokens(normalized) {
        if let Some(&col) = vocabulary.columns.get(token) {
            *tf.entry(col).or_insert(0) += 1;
        }
    }

    let weighted: Vec<(usize, f64)> = tf
        .into_iter()
        .map(|(col, count)| (col, f64::from(count) * vocabulary.idf[col]))
        .collect();

    let scale = match vocabulary.norm {
        Norm::None => 1.0,
        Norm::L2 => {
            let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                1.0 / norm
            } else {
                1.0
            }
        }
    };

    SparseVector::from_sorted(
        vocabulary.len(),
        weighted.into_iter().map(|(col, w)| (col, w * scale)),
    )
}
