//! Salain — malicious email classifier core.
//!
//! Modular structure:
//! - [`features`] — Text normalization, raw-text heuristics, TF-IDF vectorization, row assembly
//! - [`model`] — Pretrained linear classifier inference
//! - [`verdict`] — Label and label-conditional confidence
//! - [`classifier`] — `classify(raw_text)` entry point
//! - [`explain`] — Explanation cache with pluggable store and explainer
//! - [`storage`] — Encrypted SQLite cache store
//! - [`ocr`] — OCR collaborator boundary
//! - [`logging`] — Structured JSON logging

mod artifact;
pub mod classifier;
pub mod config;
pub mod error;
pub mod explain;
pub mod features;
pub mod logging;
pub mod model;
pub mod ocr;
pub mod storage;
pub mod verdict;

pub use classifier::{Analysis, EmailClassifier};
pub use config::ClassifierConfig;
pub use error::{ArtifactLoadError, ClassifyError};
pub use explain::ExplanationCache;
pub use features::{FeatureExtractor, FeatureVector, HeuristicFeatures, VocabularyTable};
pub use logging::StructuredLogger;
pub use model::LinearClassifier;
pub use verdict::{Label, Verdict};
