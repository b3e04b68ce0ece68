//! Pretrained linear classifier over the concatenated feature row.

mod linear;

pub use linear::{ClassifierArtifact, LinearClassifier};
