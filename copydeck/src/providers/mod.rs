//! Thin typed HTTP clients for the external services.
//!
//! Each concern sits behind a trait so the pipelines can be exercised against fakes or
//! `wiremock` servers:
//!
//! - [`TextGenerator`]: chat-style text generation ([`openai::OpenAiClient`], [`gemini::GeminiClient`])
//! - [`ImageCaptioner`]: one-sentence captions for user images ([`openai::OpenAiClient`])
//! - [`StockPhotoSource`]: keyword photo search ([`stock::Unsplash`], [`stock::Pexels`], [`stock::Pixabay`])
//! - [`VideoDataSource`]: video metadata and comments ([`youtube::YoutubeClient`])
//!
//! Clients return `anyhow::Result`. Callers decide whether a failure degrades to a fallback or
//! surfaces as [`crate::errors::Error::Upstream`].

pub mod gemini;
pub mod openai;
pub mod stock;
pub mod youtube;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ProvidersConfig;
use crate::errors::Upstream;
use crate::types::AiModel;

/// Install the process-wide rustls crypto provider. Safe to call more than once.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Build the shared HTTP client used by every provider.
pub fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    install_crypto_provider();
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Makes sure a url has a trailing slash.
///
/// `Url::join` replaces the last path segment unless the base ends in `/`, so
/// `https://api.pexels.com/v1` joined with `search` would lose the `v1`.
pub(crate) fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        return url.clone();
    }
    let mut new_url = url.clone();
    let path = format!("{}/", new_url.path());
    new_url.set_path(&path);
    new_url
}

/// Turn a non-2xx response into an error carrying the status and body.
pub(crate) async fn error_for_status(service: &str, response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(anyhow::anyhow!("{service} API error: {status} - {body}"))
}

/// A single-turn text generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Which service failures should be attributed to.
    fn upstream(&self) -> Upstream;

    async fn generate(&self, prompt: &Prompt) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ImageCaptioner: Send + Sync {
    /// Describe the image at `image_url` (http(s) or data URL) in a sentence.
    async fn caption(&self, image_url: &str) -> anyhow::Result<String>;
}

/// A search hit from a stock photo service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPhoto {
    pub url: String,
    pub description: Option<String>,
    pub photographer: Option<String>,
    pub photographer_url: Option<String>,
}

#[async_trait]
pub trait StockPhotoSource: Send + Sync {
    /// Short lowercase name, also used as the image `source` in responses.
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str, count: usize) -> anyhow::Result<Vec<StockPhoto>>;
}

/// Metadata for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: Option<String>,
    pub tags: Vec<String>,
    pub duration: Option<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoComment {
    pub author: String,
    pub text: String,
    pub like_count: u64,
}

#[async_trait]
pub trait VideoDataSource: Send + Sync {
    /// Metadata for `video_id`, or `None` if the video doesn't exist.
    async fn video(&self, video_id: &str) -> anyhow::Result<Option<VideoInfo>>;

    /// Top-level comments, most relevant first.
    async fn comments(&self, video_id: &str, max_results: u32) -> anyhow::Result<Vec<VideoComment>>;
}

/// Every external client the handlers use.
#[derive(Clone)]
pub struct Providers {
    pub openai: Arc<dyn TextGenerator>,
    pub gemini: Arc<dyn TextGenerator>,
    pub captioner: Arc<dyn ImageCaptioner>,
    /// Configured stock sources in priority order
    pub stock: Vec<Arc<dyn StockPhotoSource>>,
    pub videos: Arc<dyn VideoDataSource>,
    pub max_comments: u32,
}

impl Providers {
    pub fn from_config(config: &ProvidersConfig) -> anyhow::Result<Self> {
        let client = http_client(config.request_timeout)?;
        let openai = Arc::new(openai::OpenAiClient::new(client.clone(), &config.openai));

        let mut stock: Vec<Arc<dyn StockPhotoSource>> = Vec::new();
        if let Some(key) = &config.unsplash.api_key {
            stock.push(Arc::new(stock::Unsplash::new(client.clone(), config.unsplash.base_url.clone(), key.clone())));
        }
        if let Some(key) = &config.pexels.api_key {
            stock.push(Arc::new(stock::Pexels::new(client.clone(), config.pexels.base_url.clone(), key.clone())));
        }
        if let Some(key) = &config.pixabay.api_key {
            stock.push(Arc::new(stock::Pixabay::new(client.clone(), config.pixabay.base_url.clone(), key.clone())));
        }
        if stock.is_empty() {
            tracing::warn!("No stock photo provider configured, missing images will use placeholders");
        }

        Ok(Self {
            openai: openai.clone(),
            gemini: Arc::new(gemini::GeminiClient::new(client.clone(), &config.gemini)),
            captioner: openai,
            stock,
            videos: Arc::new(youtube::YoutubeClient::new(client, &config.youtube)),
            max_comments: config.youtube.max_comments,
        })
    }

    pub fn text_generator(&self, model: AiModel) -> &Arc<dyn TextGenerator> {
        match model {
            AiModel::Openai => &self.openai,
            AiModel::Gemini => &self.gemini,
        }
    }
}
