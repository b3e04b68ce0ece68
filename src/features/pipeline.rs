//! Feature row assembly: raw text → {normalize → vectorize} ++ {heuristics}.

use super::{
    normalize, vectorize, FeatureVector, HeuristicFeatures, VocabularyTable, HEURISTIC_COUNT,
};
use std::sync::Arc;

/// Builds classifier input rows. Holds only the shared, read-only vocabulary,
/// so one extractor can serve any number of threads.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    vocabulary: Arc<VocabularyTable>,
}

impl FeatureExtractor {
    pub fn new(vocabulary: Arc<VocabularyTable>) -> Self {
        Self { vocabulary }
    }

    /// Row width: vocabulary columns plus heuristic columns.
    pub fn dim(&self) -> usize {
        self.vocabulary.len() + HEURISTIC_COUNT
    }

    /// Term weights of the normalized text followed by heuristics of the raw text.
    pub fn extract(&self, raw: &str) -> (FeatureVector, HeuristicFeatures) {
        let heuristics = HeuristicFeatures::from_text(raw);
        let normalized = normalize(raw);
        let terms = vectorize(&normalized, &self.vocabulary);
        let row = terms.concat(&heuristics.to_vector());
        tracing::trace!(
            normalized_len = normalized.len(),
            term_columns = terms.nnz(),
            num_links = heuristics.num_links,
            num_obfuscated = heuristics.num_obfuscated,
            urgency_score = heuristics.urgency_score,
            "features extracted"
        );
        (row, heuristics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Norm, TermEntry, Tokenizer, VocabularyArtifact};

    fn extractor() -> FeatureExtractor {
        let vocab = VocabularyTable::from_artifact(VocabularyArtifact {
            version: None,
            tokenizer: Tokenizer::Whitespace,
            norm: Norm::None,
            terms: vec![
                TermEntry {
                    token: "verify".into(),
                    index: 0,
                    idf: 2.0,
                },
                TermEntry {
                    token: "password".into(),
                    index: 1,
                    idf: 3.0,
                },
            ],
        })
        .unwrap();
        FeatureExtractor::new(Arc::new(vocab))
    }

    #[test]
    fn heuristics_follow_vocabulary_columns() {
        let fx = extractor();
        let (row, h) = fx.extract("Please verify your password http://x.example");
        assert_eq!(row.dim(), 5);
        assert_eq!(fx.dim(), 5);
        assert_eq!(row.to_dense().to_vec(), vec![2.0, 3.0, 1.0, 0.0, 2.0]);
        assert_eq!(h.urgency_score, 2);
    }

    #[test]
    fn heuristics_see_raw_text_not_normalized() {
        // Normalization strips the URL and the '@', the heuristics still count them.
        let (row, h) = extractor().extract("p@ypal https://login.example");
        assert_eq!(h.num_links, 1);
        assert_eq!(h.num_obfuscated, 1);
        assert_eq!(row.get(2), 1.0);
        assert_eq!(row.get(3), 1.0);
    }
}
