//! `POST /api/generate` bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{KeywordsInput, non_blank};
use crate::errors::Error;
use crate::generation::{ContentBrief, PlatformContent};
use crate::images::ImageDescriptor;
use crate::types::{AiModel, Platform, UserId};

/// An uploaded image, either `{url}` or a bare URL string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ImageInput {
    Url(String),
    Object { url: String },
}

impl ImageInput {
    pub fn url(&self) -> &str {
        match self {
            ImageInput::Url(url) | ImageInput::Object { url } => url.trim(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Supabase user id; required unless `is_guest` is set
    #[serde(rename = "user_id", alias = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "is_guest", alias = "isGuest", default)]
    pub is_guest: bool,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub keywords: KeywordsInput,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub target_age: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageInput>,
    /// Any of `blog`, `instagram`, `threads`, `youtube`
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub ai_model: Option<AiModel>,
}

/// Who a generation is billed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Guest,
    User(UserId),
}

/// A generation request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedGenerate {
    pub requester: Requester,
    pub brief: ContentBrief,
    pub images: Vec<String>,
    /// Deduplicated, in request order
    pub platforms: Vec<Platform>,
    pub ai_model: AiModel,
}

impl ValidatedGenerate {
    /// Images needed to fill the most image-hungry requested platform.
    pub fn required_images(&self) -> usize {
        self.platforms.iter().map(|p| p.image_slots()).max().unwrap_or(0)
    }
}

fn bad_request(message: impl Into<String>) -> Error {
    Error::BadRequest { message: message.into() }
}

fn is_acceptable_image_url(raw: &str) -> bool {
    if raw.starts_with("data:image/") {
        return true;
    }
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<ValidatedGenerate, Error> {
        if self.platforms.is_empty() {
            return Err(bad_request("Select at least one platform"));
        }
        let mut platforms = Vec::with_capacity(self.platforms.len());
        for raw in &self.platforms {
            let platform: Platform = raw.parse().map_err(|e: String| bad_request(format!("Invalid platform: {e}")))?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }

        if self.images.is_empty() {
            return Err(bad_request("Provide at least one image"));
        }
        let mut images = Vec::with_capacity(self.images.len());
        for image in &self.images {
            let url = image.url();
            if !is_acceptable_image_url(url) {
                return Err(bad_request("Images must be http(s) or data URLs"));
            }
            images.push(url.to_string());
        }

        let brand = self.brand.trim();
        if brand.is_empty() {
            return Err(bad_request("Brand name is required"));
        }

        let requester = if self.is_guest {
            Requester::Guest
        } else {
            let raw = non_blank(&self.user_id).ok_or_else(|| bad_request("user_id is required unless is_guest is set"))?;
            let id = Uuid::parse_str(&raw).map_err(|_| bad_request("user_id must be a UUID"))?;
            Requester::User(id)
        };

        Ok(ValidatedGenerate {
            requester,
            brief: ContentBrief {
                brand: brand.to_string(),
                keywords: self.keywords.normalized(),
                tone: non_blank(&self.tone),
                target_age: non_blank(&self.target_age),
                industry: non_blank(&self.industry),
            },
            images,
            platforms,
            ai_model: self.ai_model.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub brand: String,
    pub ai_model: AiModel,
    /// Keyed by platform name
    #[schema(value_type = Object)]
    pub platforms: BTreeMap<Platform, PlatformContent>,
    pub images: Vec<ImageDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub data: GeneratedContent,
    pub credits_used: i32,
    /// Balance after the charge, `null` for guests
    pub remaining_credits: Option<i32>,
}
