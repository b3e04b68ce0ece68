//! Explanation cache: memoizes natural-language explanations of a verdict behind an
//! injected store, delegating misses to an external explainer and falling back to a
//! fixed template when that explainer fails.

mod llm;

pub use llm::LlmExplainer;

use crate::config::{CacheBackend, CacheConfig, ExplainerConfig};
use crate::error::{CacheStoreError, ExplanationError};
use crate::features::HeuristicFeatures;
use crate::storage::SqliteCacheStore;
use crate::verdict::Label;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Everything an explainer is given about one classification.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationRequest<'a> {
    pub text: &'a str,
    pub label: Label,
    pub confidence: f64,
    pub features: &'a HeuristicFeatures,
}

/// External natural-language generator. May fail; callers recover.
pub trait Explainer: Send + Sync {
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<String, ExplanationError>;
}

/// Explainer used when generation is switched off: every request takes the template path.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledExplainer;

impl Explainer for DisabledExplainer {
    fn explain(&self, _request: &ExplanationRequest<'_>) -> Result<String, ExplanationError> {
        Err(ExplanationError::Disabled)
    }
}

/// Key-value backend for cached explanations. Writers for one key always carry
/// equivalent values, so last-writer-wins is enough.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;
    fn put(&self, key: &str, value: &str) -> Result<(), CacheStoreError>;
}

/// Process-lifetime map; entries are never evicted.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let entries = self.entries.read().map_err(|_| CacheStoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        let mut entries = self.entries.write().map_err(|_| CacheStoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Hex SHA-256 over `(text, label, confidence)`. Any change to one of them yields a new key.
pub fn cache_key(text: &str, label: Label, confidence: f64) -> String {
    let mut h = Sha256::new();
    h.update(text.as_bytes());
    h.update([0u8, label.class_id()]);
    h.update(confidence.to_bits().to_be_bytes());
    format!("{:x}", h.finalize())
}

/// Deterministic explanation listing the heuristic signals that fired.
pub fn fallback_explanation(label: Label, features: &HeuristicFeatures) -> String {
    let mut out = String::new();
    match label {
        Label::Malicious => {
            out.push_str("## Potential Warning Signs:\n\n");
            if features.any() {
                for (name, _) in features.named().filter(|(_, v)| *v > 0) {
                    let _ = writeln!(out, "- {name}");
                }
            } else {
                out.push_str("- Suspicious patterns detected in email content\n");
                out.push_str("- Unusual formatting or structure\n");
                out.push_str("- Patterns matching known malicious emails\n");
            }
            out.push_str("\nExercise caution before responding or clicking any links.");
        }
        Label::Safe => {
            out.push_str("## Email appears safe:\n\n");
            out.push_str("- No suspicious patterns detected\n");
            out.push_str("- Content follows expected email structure\n");
            out.push_str("- No matches with known malicious indicators\n");
        }
    }
    out
}

fn open_sqlite(
    cache: &CacheConfig,
) -> Result<SqliteCacheStore, Box<dyn std::error::Error + Send + Sync>> {
    let secret = std::env::var(&cache.secret_env)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("{} not set", cache.secret_env))?;
    if let Some(dir) = cache.path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(SqliteCacheStore::open(&cache.path, secret.as_bytes())?)
}

pub struct ExplanationCache {
    store: Arc<dyn CacheStore>,
    explainer: Arc<dyn Explainer>,
}

impl ExplanationCache {
    pub fn new(store: Arc<dyn CacheStore>, explainer: Arc<dyn Explainer>) -> Self {
        Self { store, explainer }
    }

    pub fn in_memory(explainer: Arc<dyn Explainer>) -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), explainer)
    }

    /// Wire store and explainer from configuration. Anything that cannot be set up
    /// degrades (memory store, template-only explanations) with a warning.
    pub fn from_config(cache: &CacheConfig, explainer: &ExplainerConfig) -> Self {
        let explainer: Arc<dyn Explainer> = if explainer.enabled {
            match LlmExplainer::new(explainer.clone()) {
                Ok(e) => Arc::new(e),
                Err(e) => {
                    warn!(error = %e, "explainer unavailable; explanations use the template");
                    Arc::new(DisabledExplainer)
                }
            }
        } else {
            Arc::new(DisabledExplainer)
        };

        let store: Arc<dyn CacheStore> = match cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCacheStore::new()),
            CacheBackend::Sqlite => match open_sqlite(cache) {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    warn!(
                        path = %cache.path.display(),
                        error = %e,
                        "sqlite cache unavailable; using memory"
                    );
                    Arc::new(MemoryCacheStore::new())
                }
            },
        };

        Self::new(store, explainer)
    }

    /// Cached explanation for this verdict, generating and storing it on a miss.
    /// Never fails: store errors count as misses, explainer errors yield the template,
    /// which is not cached so a later call can still get a generated explanation.
    pub fn get_or_generate(
        &self,
        text: &str,
        label: Label,
        confidence: f64,
        features: &HeuristicFeatures,
    ) -> String {
        let key = cache_key(text, label, confidence);

        match self.store.get(&key) {
            Ok(Some(hit)) => {
                debug!(key = %key, "explanation cache hit");
                return hit;
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "explanation cache read failed"),
        }

        let request = ExplanationRequest {
            text,
            label,
            confidence,
            features,
        };
        match self.explainer.explain(&request) {
            Ok(explanation) => {
                if let Err(e) = self.store.put(&key, &explanation) {
                    warn!(key = %key, error = %e, "explanation cache write failed");
                }
                explanation
            }
            Err(ExplanationError::Disabled) => fallback_explanation(label, features),
            Err(e) => {
                warn!(error = %e, "explanation generation failed; using template");
                fallback_explanation(label, features)
            }
        }
    }
}
