//! Salain entrypoint: loads artifacts once, classifies one email read from `--text`,
//! `--file` or stdin, and prints the analysis as one JSON line on stdout.

use clap::Parser;
use salain::{
    config::ClassifierConfig, logging::StructuredLogger, Analysis, EmailClassifier,
    ExplanationCache,
};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "salain", version, about = "Classify email text as safe or malicious")]
struct Cli {
    /// Config file (default: $SALAIN_CONFIG_PATH, then config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Email text to classify
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,

    /// Read the email from this file instead of stdin
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Attach an explanation of the verdict
    #[arg(long)]
    explain: bool,
}

#[derive(Serialize)]
struct Output {
    #[serde(flatten)]
    analysis: Analysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

fn read_input(cli: &Cli) -> std::io::Result<String> {
    if let Some(ref text) = cli.text {
        return Ok(text.clone());
    }
    if let Some(ref path) = cli.file {
        return std::fs::read_to_string(path);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("SALAIN_CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let config = ClassifierConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(config = %config_path.display(), "salain starting");

    let classifier = EmailClassifier::from_artifacts(
        &config.artifacts.vocabulary_path,
        &config.artifacts.model_path,
    )
    .map_err(|e| {
        error!(error = %e, "cannot load model artifacts");
        e
    })?;

    let text = read_input(&cli)?;
    if text.trim().is_empty() {
        warn!("input is empty; classifying as degenerate input");
    }

    let analysis = classifier.analyze(&text).map_err(|e| {
        error!(error = %e, "classification failed");
        e
    })?;
    info!(
        id = %analysis.id,
        label = %analysis.verdict.label,
        confidence = analysis.verdict.confidence,
        "classification complete"
    );

    let explanation = cli.explain.then(|| {
        ExplanationCache::from_config(&config.cache, &config.explainer).get_or_generate(
            &text,
            analysis.verdict.label,
            analysis.verdict.confidence,
            &analysis.features,
        )
    });

    let output = Output {
        analysis,
        explanation,
    };
    StructuredLogger::emit_json(&output, &mut std::io::stdout().lock());
    Ok(())
}
