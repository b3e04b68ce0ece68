//! Turns the classifier's malicious-class probability into a label and the confidence
//! of that label.

use serde::{Deserialize, Serialize};

/// Probability strictly above this is labeled malicious.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Safe,
    Malicious,
}

impl Label {
    pub fn from_probability(p_malicious: f64) -> Self {
        if p_malicious > DECISION_THRESHOLD {
            Label::Malicious
        } else {
            Label::Safe
        }
    }

    /// Training-time class id: 1 = malicious, 0 = safe.
    pub fn class_id(self) -> u8 {
        match self {
            Label::Safe => 0,
            Label::Malicious => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Safe => "safe",
            Label::Malicious => "malicious",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label plus the probability mass assigned to that label (always >= 0.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    pub confidence: f64,
}

impl Verdict {
    /// `p_malicious` must lie in `[0, 1]`.
    pub fn from_probability(p_malicious: f64) -> Self {
        let p = p_malicious.clamp(0.0, 1.0);
        let label = Label::from_probability(p);
        let confidence = match label {
            Label::Malicious => p,
            Label::Safe => 1.0 - p,
        };
        Self { label, confidence }
    }
}
