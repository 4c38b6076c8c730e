//! OpenAI chat completions client, used for copywriting, video analysis and image captions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{ImageCaptioner, Prompt, TextGenerator, ensure_slash, error_for_status};
use crate::config::OpenAiConfig;
use crate::errors::Upstream;

const CAPTION_INSTRUCTION: &str =
    "Describe this image in one short sentence suitable as alt text for a marketing post. Reply with the sentence only.";

pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    text_model: String,
    vision_model: String,
}

impl OpenAiClient {
    pub fn new(client: Client, config: &OpenAiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            text_model: config.text_model.clone(),
            vision_model: config.vision_model.clone(),
        }
    }

    async fn complete(&self, request: &ChatCompletionRequest<'_>) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("OpenAI API key is not configured"))?;
        let url = ensure_slash(&self.base_url).join("chat/completions")?;

        debug!("Requesting chat completion from {} with model {}", url, request.model);
        let response = self.client.post(url).bearer_auth(api_key).json(request).send().await?;
        let response: ChatCompletionResponse = error_for_status("OpenAI", response).await?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow::anyhow!("OpenAI returned no content"))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn upstream(&self) -> Upstream {
        Upstream::OpenAi
    }

    #[instrument(skip_all, fields(model = %self.text_model))]
    async fn generate(&self, prompt: &Prompt) -> anyhow::Result<String> {
        let request = ChatCompletionRequest {
            model: &self.text_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&prompt.system),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Text(&prompt.user),
                },
            ],
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
        };
        self.complete(&request).await
    }
}

#[async_trait]
impl ImageCaptioner for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.vision_model))]
    async fn caption(&self, image_url: &str) -> anyhow::Result<String> {
        let request = ChatCompletionRequest {
            model: &self.vision_model,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: CAPTION_INSTRUCTION },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ]),
            }],
            max_tokens: 100,
            temperature: 0.3,
        };
        self.complete(&request).await
    }
}
