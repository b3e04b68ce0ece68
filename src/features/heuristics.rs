//! Heuristic counts over the raw, unnormalized email text. Link and obfuscation patterns
//! depend on punctuation that normalization removes, so these never see normalized text.

use super::{SparseVector, HEURISTIC_COUNT, HEURISTIC_SCHEMA};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Case-sensitive urgency keywords, counted as substrings.
pub const URGENCY_KEYWORDS: [&str; 4] = ["urgent", "immediately", "verify", "password"];

static LINK: OnceLock<Regex> = OnceLock::new();
static OBFUSCATED: OnceLock<Regex> = OnceLock::new();

fn link_pattern() -> &'static Regex {
    LINK.get_or_init(|| Regex::new(r"http\S+").expect("link pattern"))
}

fn obfuscated_pattern() -> &'static Regex {
    OBFUSCATED.get_or_init(|| Regex::new(r"\w+[@$]\w+").expect("obfuscation pattern"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicFeatures {
    pub num_links: u32,
    /// Words joined by `@` or `$`, e.g. "p@ypal"
    pub num_obfuscated: u32,
    pub urgency_score: u32,
}

impl HeuristicFeatures {
    pub fn from_text(raw: &str) -> Self {
        Self {
            num_links: saturating_count(link_pattern().find_iter(raw).count()),
            num_obfuscated: saturating_count(obfuscated_pattern().find_iter(raw).count()),
            urgency_score: saturating_count(
                URGENCY_KEYWORDS
                    .iter()
                    .map(|kw| count_overlapping(raw, kw))
                    .sum(),
            ),
        }
    }

    /// Values in `HEURISTIC_SCHEMA` order.
    pub fn values(&self) -> [u32; HEURISTIC_COUNT] {
        [self.num_links, self.num_obfuscated, self.urgency_score]
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, u32)> {
        HEURISTIC_SCHEMA.into_iter().zip(self.values())
    }

    pub fn any(&self) -> bool {
        self.values().iter().any(|&v| v > 0)
    }

    /// The heuristic tail of the feature row.
    pub fn to_vector(&self) -> SparseVector {
        SparseVector::from_sorted(
            HEURISTIC_COUNT,
            self.values()
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i, f64::from(v))),
        )
    }
}

fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn count_overlapping(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack
        .char_indices()
        .filter(|(i, _)| haystack[*i..].starts_with(needle))
        .count()
}

/// Structural and lexical signals of `raw`; absent patterns count as zero.
pub fn extract_features(raw: &str) -> HeuristicFeatures {
    HeuristicFeatures::from_text(raw)
}
