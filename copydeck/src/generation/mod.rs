//! Per-platform copy generation.
//!
//! Platforms are generated one after another with the selected model. A platform whose call
//! fails gets a fixed fallback block marked `failed`; the others are unaffected.

pub mod prompts;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::images::ImageDescriptor;
use crate::providers::TextGenerator;
use crate::types::Platform;

const THREADS_MAX_CHARS: usize = 500;

/// What the copy is about.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBrief {
    pub brand: String,
    pub keywords: Vec<String>,
    pub tone: Option<String>,
    pub target_age: Option<String>,
    pub industry: Option<String>,
}

impl ContentBrief {
    /// Search phrase for stock photos: the keywords, or the brand when there are none.
    pub fn image_query(&self) -> String {
        if self.keywords.is_empty() {
            self.brand.clone()
        } else {
            self.keywords.join(" ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Failed,
}

/// Generated copy for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformContent {
    pub status: GenerationStatus,
    pub content: String,
    pub hashtags: Vec<String>,
    pub char_count: usize,
}

impl PlatformContent {
    fn success(platform: Platform, text: &str) -> Self {
        let content = match platform {
            Platform::Threads => truncate_chars(text, THREADS_MAX_CHARS),
            _ => text.to_string(),
        };
        Self {
            hashtags: extract_hashtags(&content),
            char_count: content.chars().count(),
            status: GenerationStatus::Success,
            content,
        }
    }

    pub fn fallback(platform: Platform, brand: &str) -> Self {
        let content = format!(
            "We couldn't generate {platform} content for {brand} right now. Please try again in a moment."
        );
        Self {
            status: GenerationStatus::Failed,
            char_count: content.chars().count(),
            content,
            hashtags: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == GenerationStatus::Success
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Hashtags in order of first appearance, without duplicates.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        let Some(tag) = word.strip_prefix('#') else {
            continue;
        };
        let tag: String = tag.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
        if tag.is_empty() {
            continue;
        }
        let tag = format!("#{tag}");
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Generate copy for each platform in turn.
#[instrument(skip_all, fields(brand = %brief.brand, platforms = platforms.len()))]
pub async fn generate_platforms(
    generator: &dyn TextGenerator,
    brief: &ContentBrief,
    platforms: &[Platform],
    images: &[ImageDescriptor],
) -> BTreeMap<Platform, PlatformContent> {
    let mut results = BTreeMap::new();
    for &platform in platforms {
        let prompt = prompts::platform_prompt(platform, brief, images);
        let content = match generator.generate(&prompt).await {
            Ok(text) => {
                info!("Generated {} content", platform);
                PlatformContent::success(platform, &text)
            }
            Err(e) => {
                warn!("Generating {} content failed, using fallback: {:#}", platform, e);
                PlatformContent::fallback(platform, &brief.brand)
            }
        };
        results.insert(platform, content);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeTextGenerator;

    fn brief() -> ContentBrief {
        ContentBrief {
            brand: "Bean & Leaf".to_string(),
            keywords: vec![],
            tone: Some("playful".to_string()),
            target_age: None,
            industry: Some("coffee".to_string()),
        }
    }

    #[test]
    fn test_extract_hashtags() {
        assert_eq!(
            extract_hashtags("Sip slow. #coldbrew #summer_vibes! #coldbrew # #"),
            ["#coldbrew", "#summer_vibes"]
        );
    }

    #[test]
    fn test_threads_content_is_capped() {
        let long = "é".repeat(600);
        let content = PlatformContent::success(Platform::Threads, &long);
        assert_eq!(content.char_count, 500);

        let content = PlatformContent::success(Platform::Blog, &long);
        assert_eq!(content.char_count, 600);
    }

    #[test]
    fn test_image_query_falls_back_to_brand() {
        assert_eq!(brief().image_query(), "Bean & Leaf");
        let with_keywords = ContentBrief {
            keywords: vec!["iced".to_string(), "latte".to_string()],
            ..brief()
        };
        assert_eq!(with_keywords.image_query(), "iced latte");
    }

    #[tokio::test]
    async fn test_failed_platform_gets_fallback_only_for_itself() {
        let generator = FakeTextGenerator::failing_when("Threads post");

        let results = generate_platforms(&generator, &brief(), &[Platform::Instagram, Platform::Threads], &[]).await;

        assert_eq!(results.len(), 2);
        assert!(results[&Platform::Instagram].succeeded());
        assert!(!results[&Platform::Threads].succeeded());
        assert!(results[&Platform::Threads].content.contains("Bean & Leaf"));
        assert_eq!(generator.calls(), 2);
    }
}
