//! Classification entry point: raw email text → verdict.

use crate::error::{ArtifactLoadError, ClassifyError};
use crate::features::{FeatureExtractor, HeuristicFeatures, VocabularyTable};
use crate::model::LinearClassifier;
use crate::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Verdict plus the signals behind it, for callers that show red flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: String,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub verdict: Verdict,
    pub malicious_probability: f64,
    pub features: HeuristicFeatures,
}

/// Vocabulary and model, validated against each other once and then shared read-only.
/// Cloning is cheap; every method takes `&self` and holds no locks.
#[derive(Debug, Clone)]
pub struct EmailClassifier {
    extractor: FeatureExtractor,
    model: Arc<LinearClassifier>,
}

impl EmailClassifier {
    pub fn new(
        vocabulary: Arc<VocabularyTable>,
        model: Arc<LinearClassifier>,
    ) -> Result<Self, ArtifactLoadError> {
        model.check_vocabulary(&vocabulary)?;
        Ok(Self {
            extractor: FeatureExtractor::new(vocabulary),
            model,
        })
    }

    /// Load both artifacts and check that the model was trained on this vocabulary.
    pub fn from_artifacts(
        vocabulary_path: &Path,
        model_path: &Path,
    ) -> Result<Self, ArtifactLoadError> {
        let vocabulary = VocabularyTable::load(vocabulary_path)?;
        let model = LinearClassifier::load(model_path)?;
        Self::new(Arc::new(vocabulary), Arc::new(model))
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn model(&self) -> &LinearClassifier {
        &self.model
    }

    pub fn classify(&self, raw: &str) -> Result<Verdict, ClassifyError> {
        let (row, _) = self.extractor.extract(raw);
        let verdict = self.model.predict(&row)?;
        debug!(label = %verdict.label, confidence = verdict.confidence, "classified");
        Ok(verdict)
    }

    pub fn analyze(&self, raw: &str) -> Result<Analysis, ClassifyError> {
        let (row, features) = self.extractor.extract(raw);
        let p = self.model.malicious_probability(&row)?;
        let verdict = Verdict::from_probability(p);
        let analysis = Analysis {
            id: Uuid::new_v4().to_string(),
            ts: Utc::now(),
            verdict,
            malicious_probability: p,
            features,
        };
        debug!(
            id = %analysis.id,
            label = %verdict.label,
            confidence = verdict.confidence,
            "analyzed"
        );
        Ok(analysis)
    }
}
