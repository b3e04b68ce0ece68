//! Integration test: artifact load, end-to-end classification, cache, storage, OCR boundary.

use salain::{
    config::ClassifierConfig,
    error::{ArtifactLoadError, ClassifyError},
    explain::{cache_key, CacheStore, ExplanationCache, ExplanationRequest, Explainer},
    features::{extract_features, normalize, SparseVector},
    ocr::{extract_text, ImageInput, OcrEngine},
    storage::SqliteCacheStore,
    EmailClassifier, Label, LinearClassifier, VocabularyTable,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn classifier() -> EmailClassifier {
    EmailClassifier::from_artifacts(&fixture("vocabulary.json"), &fixture("classifier.json"))
        .expect("fixture artifacts load")
}

const PHISHING: &str = "urgent! verify your password now: http://evil.example/login";
const MEETING: &str = "Hello, the meeting is tomorrow at 3pm in Room 204.";

#[test]
fn config_load_default() {
    let c = ClassifierConfig::load(Path::new("nonexistent.json"));
    assert!(!c.explainer.enabled);
    assert_eq!(c.explainer.max_text_chars, 3000);
    assert!(c.log.json);
}

#[test]
fn phishing_email_is_malicious() {
    let f = extract_features(PHISHING);
    assert_eq!(f.num_links, 1);
    assert_eq!(f.num_obfuscated, 0);
    assert!(f.urgency_score >= 3);

    let v = classifier().classify(PHISHING).unwrap();
    assert_eq!(v.label, Label::Malicious);
    assert!(v.confidence > 0.5);
}

#[test]
fn meeting_email_is_safe() {
    let f = extract_features(MEETING);
    assert_eq!((f.num_links, f.num_obfuscated, f.urgency_score), (0, 0, 0));

    let v = classifier().classify(MEETING).unwrap();
    assert_eq!(v.label, Label::Safe);
    assert!(v.confidence > 0.5);
}

#[test]
fn empty_input_is_a_defined_result() {
    let c = classifier();
    assert_eq!(normalize(""), "");
    let (row, features) = c.extractor().extract("");
    assert_eq!(features, Default::default());
    assert!(row.is_zero());
    assert_eq!(row.dim(), c.model().dim());

    let v = c.classify("").unwrap();
    // Only the intercept (-1.2) contributes.
    let p = 1.0 / (1.0 + 1.2f64.exp());
    assert_eq!(v.label, Label::Safe);
    assert!((v.confidence - (1.0 - p)).abs() < 1e-12);
}

#[test]
fn confidence_is_label_conditional() {
    let c = classifier();
    let inputs = [
        PHISHING,
        MEETING,
        "",
        "your account",
        "Click to claim your prize, winner! Send your p@ssword to http://x.example",
        "thanks for the report, see agenda",
        "<b>URGENT</b> bank notice",
    ];
    for text in inputs {
        let a = c.analyze(text).unwrap();
        let p = a.malicious_probability;
        assert!((0.0..=1.0).contains(&a.verdict.confidence));
        match a.verdict.label {
            Label::Malicious => {
                assert!(p > 0.5);
                assert_eq!(a.verdict.confidence, p);
            }
            Label::Safe => {
                assert!(p <= 0.5);
                assert_eq!(a.verdict.confidence, 1.0 - p);
            }
        }
        assert_eq!(a.verdict, c.classify(text).unwrap());
    }
}

#[test]
fn classify_is_bit_identical_across_calls_and_threads() {
    let c = classifier();
    let first = c.classify(PHISHING).unwrap();
    let second = c.classify(PHISHING).unwrap();
    assert_eq!(first.label, second.label);
    assert_eq!(first.confidence.to_bits(), second.confidence.to_bits());

    let shared = Arc::new(c);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let c = Arc::clone(&shared);
            std::thread::spawn(move || c.classify(PHISHING).unwrap())
        })
        .collect();
    for h in handles {
        let v = h.join().unwrap();
        assert_eq!(v.confidence.to_bits(), first.confidence.to_bits());
    }
}

#[test]
fn wrong_width_rows_are_rejected() {
    let model = LinearClassifier::load(&fixture("classifier.json")).unwrap();
    assert_eq!(model.dim(), 31);
    for width in [0, 28, 30, 32] {
        let err = model.predict(&SparseVector::zeros(width)).unwrap_err();
        assert_eq!(
            err,
            ClassifyError::DimensionMismatch {
                expected: 31,
                actual: width
            }
        );
    }
}

#[test]
fn serialized_rows_are_validated_before_prediction() {
    let model = LinearClassifier::load(&fixture("classifier.json")).unwrap();

    let out_of_range = r#"{"dim":31,"entries":[[500,1.0]]}"#;
    assert!(serde_json::from_str::<SparseVector>(out_of_range).is_err());

    let (row, _) = classifier().extractor().extract(PHISHING);
    let json = serde_json::to_string(&row).unwrap();
    let back: SparseVector = serde_json::from_str(&json).unwrap();
    assert_eq!(back, row);
    assert_eq!(model.predict(&back).unwrap(), model.predict(&row).unwrap());
}

#[test]
fn missing_and_malformed_artifacts_fail_to_load() {
    let err = VocabularyTable::load(Path::new("nonexistent-vocab.json")).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Missing { .. }));

    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("vocab.json");
    std::fs::write(&bad, "{\"terms\": [").unwrap();
    let err = VocabularyTable::load(&bad).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Malformed { .. }));

    let gap = dir.path().join("gap.json");
    std::fs::write(
        &gap,
        r#"{"terms":[{"token":"a","index":0,"idf":1.0},{"token":"b","index":2,"idf":1.0}]}"#,
    )
    .unwrap();
    let err = VocabularyTable::load(&gap).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Inconsistent { .. }));
}

#[test]
fn model_must_match_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    let small = dir.path().join("vocab.json");
    std::fs::write(&small, r#"{"terms":[{"token":"verify","index":0,"idf":1.0}]}"#).unwrap();
    let err = EmailClassifier::from_artifacts(&small, &fixture("classifier.json")).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Inconsistent { .. }));

    let vocab = VocabularyTable::load(&fixture("vocabulary.json")).unwrap();
    let raw_model = std::fs::read_to_string(fixture("classifier.json")).unwrap();
    let mut model: serde_json::Value = serde_json::from_str(&raw_model).unwrap();

    model["vocabulary_sha256"] = serde_json::Value::String(vocab.digest());
    let good = dir.path().join("good.json");
    std::fs::write(&good, model.to_string()).unwrap();
    assert!(EmailClassifier::from_artifacts(&fixture("vocabulary.json"), &good).is_ok());

    model["vocabulary_sha256"] = serde_json::Value::String("0".repeat(64));
    let stale = dir.path().join("stale.json");
    std::fs::write(&stale, model.to_string()).unwrap();
    let err = EmailClassifier::from_artifacts(&fixture("vocabulary.json"), &stale).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Inconsistent { .. }));
}

#[test]
fn normalize_is_idempotent_on_email_like_text() {
    let samples = [
        PHISHING,
        MEETING,
        "<html><body><p>Dear Customer,</p><a href=\"http://x\">Click HERE</a></body></html>",
        "Reply to billing@pay.example or WWW.Example.COM/Reset &nbsp; NOW!!",
        "\t\n  ",
    ];
    for s in samples {
        let once = normalize(s);
        assert_eq!(normalize(&once), once);
    }
}

struct Counting(AtomicUsize);

impl Explainer for Counting {
    fn explain(
        &self,
        r: &ExplanationRequest<'_>,
    ) -> Result<String, salain::error::ExplanationError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{} at {:.2}", r.label, r.confidence))
    }
}

#[test]
fn explanation_cache_generates_once() {
    let c = classifier();
    let a = c.analyze(PHISHING).unwrap();
    let explainer = Arc::new(Counting(AtomicUsize::new(0)));
    let cache = ExplanationCache::in_memory(explainer.clone());
    let (label, confidence) = (a.verdict.label, a.verdict.confidence);
    let first = cache.get_or_generate(PHISHING, label, confidence, &a.features);
    let second = cache.get_or_generate(PHISHING, label, confidence, &a.features);
    assert_eq!(first, second);
    assert_eq!(explainer.0.load(Ordering::SeqCst), 1);
}

#[test]
fn sqlite_store_persists_encrypted_explanations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("explanations.db");
    let key = cache_key("text", Label::Safe, 0.75);

    {
        let store = SqliteCacheStore::open(&path, b"test-secret").unwrap();
        assert!(store.get(&key).unwrap().is_none());
        store.put(&key, "first").unwrap();
        store.put(&key, "second").unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    let reopened = SqliteCacheStore::open(&path, b"test-secret").unwrap();
    assert_eq!(reopened.get(&key).unwrap().as_deref(), Some("second"));

    let raw = std::fs::read(&path).unwrap();
    assert!(!raw.windows(6).any(|w| w == b"second"));

    let wrong = SqliteCacheStore::open(&path, b"other-secret").unwrap();
    assert!(wrong.get(&key).is_err());
}

#[test]
fn sqlite_backed_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("explanations.db");
    let f = extract_features(PHISHING);
    let explainer = Arc::new(Counting(AtomicUsize::new(0)));

    for _ in 0..2 {
        let store = Arc::new(SqliteCacheStore::open(&path, b"s").unwrap());
        let cache = ExplanationCache::new(store, explainer.clone());
        let out = cache.get_or_generate(PHISHING, Label::Malicious, 0.99, &f);
        assert_eq!(out, "malicious at 0.99");
    }
    assert_eq!(explainer.0.load(Ordering::SeqCst), 1);
}

struct Unreadable;

impl OcrEngine for Unreadable {
    fn recognize(&self, _: &ImageInput<'_>) -> Result<Vec<String>, salain::error::OcrError> {
        Err(salain::error::OcrError::Recognition("blurry".into()))
    }
}

#[test]
fn failed_ocr_still_classifies() {
    let text = extract_text(&Unreadable, &ImageInput { bytes: &[0u8; 16] });
    assert_eq!(text, "");
    assert!(classifier().classify(&text).is_ok());
}
