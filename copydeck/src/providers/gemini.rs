//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{Prompt, TextGenerator, ensure_slash, error_for_status};
use crate::config::GeminiConfig;
use crate::errors::Upstream;

pub struct GeminiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(client: Client, config: &GeminiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    system_instruction: GeminiContent<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn upstream(&self) -> Upstream {
        Upstream::Gemini
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &Prompt) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Gemini API key is not configured"))?;

        let mut url = ensure_slash(&self.base_url).join(&format!("models/{}:generateContent", self.model))?;
        url.query_pairs_mut().append_pair("key", api_key);

        let request = GenerateContentRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: &prompt.user }],
            }],
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: &prompt.system }],
            },
            generation_config: GenerationConfig {
                max_output_tokens: prompt.max_tokens,
                temperature: prompt.temperature,
            },
        };

        debug!("Requesting content from Gemini model {}", self.model);
        let response = self.client.post(url).json(&request).send().await?;
        let response: GenerateContentResponse = error_for_status("Gemini", response).await?.json().await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("Gemini returned no content");
        }
        Ok(text.to_string())
    }
}
