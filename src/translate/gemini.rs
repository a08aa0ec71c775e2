use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Translator;
use crate::config::GeminiConfig;
use crate::PipelineError;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Result<String, PipelineError> {
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| PipelineError::TranslationFailure("Gemini returned no candidates".to_string()))?;

        let text: String = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .map(|part| part.text.as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(PipelineError::TranslationFailure(format!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

/// Google Generative Language API client
pub struct GeminiTranslator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiTranslator {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!("Calling Gemini model {} ({} prompt bytes)", self.model, prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::TranslationFailure(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::TranslationFailure(format!(
                "Gemini API error: HTTP {} {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                PipelineError::TranslationFailure(format!("Invalid Gemini response: {}", e.without_url()))
            })?;

        response.text()
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
