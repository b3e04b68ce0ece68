//! Logistic-regression inference. Input: sparse row of `vocabulary_size + 3` columns,
//! output: malicious-class probability and the resulting verdict.
//!
//! The artifact records the row layout it was trained on (vocabulary size, heuristic
//! column names, optional vocabulary digest); it is checked at load and on every call.

use crate::artifact::read_json;
use crate::error::{ArtifactLoadError, ClassifyError};
use crate::features::{FeatureVector, VocabularyTable, HEURISTIC_COUNT, HEURISTIC_SCHEMA};
use crate::verdict::Verdict;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ARTIFACT: &str = "classifier";

/// Class id the training labels use for malicious mail.
pub const MALICIOUS_CLASS: i64 = 1;

fn default_classes() -> [i64; 2] {
    [0, MALICIOUS_CLASS]
}

fn default_positive_class() -> i64 {
    MALICIOUS_CLASS
}

/// On-disk classifier layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    #[serde(default)]
    pub version: Option<String>,
    pub vocabulary_size: usize,
    pub heuristic_features: Vec<String>,
    /// One coefficient per column: vocabulary columns, then heuristic columns.
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Class ids in the order the model's probabilities are reported; the logistic
    /// function gives the probability of `classes[1]`.
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
    #[serde(default = "default_positive_class")]
    pub positive_class: i64,
    #[serde(default)]
    pub vocabulary_sha256: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LinearClassifier {
    version: Option<String>,
    vocabulary_size: usize,
    weights: Array1<f64>,
    intercept: f64,
    /// Whether the logistic output is P(malicious) directly or its complement.
    positive_is_second: bool,
    vocabulary_sha256: Option<String>,
}

impl LinearClassifier {
    pub fn load(path: &Path) -> Result<Self, ArtifactLoadError> {
        let artifact: ClassifierArtifact = read_json(path)?;
        let model = Self::from_artifact(artifact)?;
        tracing::info!(
            path = %path.display(),
            dim = model.dim(),
            version = model.version.as_deref().unwrap_or("unversioned"),
            "classifier loaded"
        );
        Ok(model)
    }

    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, ArtifactLoadError> {
        if artifact.heuristic_features.len() != HEURISTIC_COUNT
            || artifact
                .heuristic_features
                .iter()
                .zip(HEURISTIC_SCHEMA)
                .any(|(have, want)| have != want)
        {
            return Err(ArtifactLoadError::inconsistent(
                ARTIFACT,
                format!(
                    "heuristic columns {:?} do not match {:?}",
                    artifact.heuristic_features, HEURISTIC_SCHEMA
                ),
            ));
        }

        let expected = artifact.vocabulary_size + HEURISTIC_COUNT;
        if artifact.weights.len() != expected {
            return Err(ArtifactLoadError::inconsistent(
                ARTIFACT,
                format!(
                    "{} weights for {} vocabulary + {} heuristic columns",
                    artifact.weights.len(),
                    artifact.vocabulary_size,
                    HEURISTIC_COUNT
                ),
            ));
        }

        if let Some(col) = artifact.weights.iter().position(|w| !w.is_finite()) {
            return Err(ArtifactLoadError::inconsistent(
                ARTIFACT,
                format!("weight at column {col} is not finite"),
            ));
        }
        if !artifact.intercept.is_finite() {
            return Err(ArtifactLoadError::inconsistent(ARTIFACT, "intercept is not finite"));
        }

        let [first, second] = artifact.classes;
        if first == second {
            return Err(ArtifactLoadError::inconsistent(
                ARTIFACT,
                format!("class ids must differ, got {:?}", artifact.classes),
            ));
        }
        let positive_is_second = if artifact.positive_class == second {
            true
        } else if artifact.positive_class == first {
            false
        } else {
            return Err(ArtifactLoadError::inconsistent(
                ARTIFACT,
                format!(
                    "positive class {} not in {:?}",
                    artifact.positive_class, artifact.classes
                ),
            ));
        };

        Ok(Self {
            version: artifact.version,
            vocabulary_size: artifact.vocabulary_size,
            weights: Array1::from_vec(artifact.weights),
            intercept: artifact.intercept,
            positive_is_second,
            vocabulary_sha256: artifact.vocabulary_sha256.map(|s| s.to_ascii_lowercase()),
        })
    }

    /// Fail unless `vocabulary` produces exactly the term columns this model was trained on.
    pub fn check_vocabulary(&self, vocabulary: &VocabularyTable) -> Result<(), ArtifactLoadError> {
        if vocabulary.len() != self.vocabulary_size {
            return Err(ArtifactLoadError::inconsistent(
                ARTIFACT,
                format!(
                    "trained on {} vocabulary columns, vocabulary has {}",
                    self.vocabulary_size,
                    vocabulary.len()
                ),
            ));
        }
        if let Some(ref want) = self.vocabulary_sha256 {
            let have = vocabulary.digest();
            if &have != want {
                return Err(ArtifactLoadError::inconsistent(
                    ARTIFACT,
                    format!("vocabulary digest {have} does not match trained {want}"),
                ));
            }
        }
        Ok(())
    }

    /// Expected feature row width.
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Raw linear score `intercept + w·x`; columns are visited in ascending order.
    pub fn decision_function(&self, features: &FeatureVector) -> Result<f64, ClassifyError> {
        self.check_dim(features)?;
        let z = features
            .iter()
            .fold(self.intercept, |acc, (col, x)| acc + self.weights[col] * x);
        if z.is_finite() {
            Ok(z)
        } else {
            Err(ClassifyError::NonFiniteScore)
        }
    }

    /// Probability that the row is malicious.
    pub fn malicious_probability(&self, features: &FeatureVector) -> Result<f64, ClassifyError> {
        let p_second = sigmoid(self.decision_function(features)?);
        Ok(if self.positive_is_second {
            p_second
        } else {
            1.0 - p_second
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Verdict, ClassifyError> {
        self.malicious_probability(features).map(Verdict::from_probability)
    }

    fn check_dim(&self, features: &FeatureVector) -> Result<(), ClassifyError> {
        if features.dim() != self.dim() {
            return Err(ClassifyError::DimensionMismatch {
                expected: self.dim(),
                actual: features.dim(),
            });
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
