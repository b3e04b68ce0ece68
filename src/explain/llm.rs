//! HTTP explainer: asks a hosted language model to explain a verdict to a non-technical reader.

use super::{ExplanationRequest, Explainer};
use crate::config::ExplainerConfig;
use crate::error::ExplanationError;
use crate::verdict::Label;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

const API_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You are a cybersecurity expert explaining email classification results. \
Provide clear, concise explanations in bullet points. Use simple language for non-experts.";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// User prompt for one verdict; the email text is cut to `max_text_chars` characters.
pub(crate) fn user_prompt(request: &ExplanationRequest<'_>, max_text_chars: usize) -> String {
    let text: String = request.text.chars().take(max_text_chars).collect();
    let classification = match request.label {
        Label::Malicious => "Malicious",
        Label::Safe => "Safe",
    };
    let fired: Vec<&str> = request
        .features
        .named()
        .filter(|(_, v)| *v > 0)
        .map(|(name, _)| name)
        .collect();
    let features = if fired.is_empty() {
        "None detected".to_string()
    } else {
        fired.join(", ")
    };
    format!(
        "Email Content: {text}\n\
         Classification: {classification}\n\
         Confidence: {:.2}%\n\
         Key Features: {features}\n\n\
         No need to include pleasantries in your response. \
         Directly explain this classification to a non-technical user. Highlight 3-5 main reasons. \
         For malicious classifications, list red flags. For safe emails, explain positive indicators.",
        request.confidence * 100.0
    )
}

pub struct LlmExplainer {
    config: ExplainerConfig,
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl LlmExplainer {
    pub fn new(config: ExplainerConfig) -> Result<Self, ExplanationError> {
        if !config.enabled {
            return Err(ExplanationError::Disabled);
        }
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ExplanationError::MissingApiKey(config.api_key_env.clone()))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        let base_url = config.endpoint.trim_end_matches('/').to_string();
        info!(endpoint = %base_url, model = %config.model, "explainer enabled");
        Ok(Self {
            config,
            client,
            base_url,
            api_key,
        })
    }
}

impl Explainer for LlmExplainer {
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<String, ExplanationError> {
        let prompt = user_prompt(request, self.config.max_text_chars);
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: SYSTEM_PROMPT,
            messages: [Message {
                role: "user",
                content: &prompt,
            }],
        };
        let res = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().unwrap_or_default();
            return Err(ExplanationError::Status { status, body });
        }
        let parsed: MessagesResponse = res.json()?;
        parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .find_map(|b| b.text.filter(|t| !t.trim().is_empty()))
            .ok_or(ExplanationError::EmptyResponse)
    }
}
