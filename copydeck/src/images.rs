//! Tiered image resolution for generated posts.
//!
//! Produces exactly the requested number of images, drawing from these tiers in order:
//!
//! 1. User uploads, each captioned by the vision model. Captions are requested concurrently and
//!    a failed caption falls back to a generic one.
//! 2. Stock photo sources in priority order, one call per source asking for a third of what is
//!    still missing (rounded up). A failing source contributes nothing.
//! 3. Placeholder images, which need no I/O.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;
use utoipa::ToSchema;

use crate::providers::{ImageCaptioner, StockPhotoSource};

const PLACEHOLDER_BASE: &str = "https://placehold.co/1200x630";
const UPLOAD_CAPTION_FALLBACK: &str = "Uploaded brand image";

/// One image attached to generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub url: String,
    pub caption: String,
    /// `user`, `placeholder`, or the stock source name (`unsplash`, `pexels`, `pixabay`)
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographer_url: Option<String>,
}

impl ImageDescriptor {
    pub fn placeholder(query: &str, index: usize) -> Self {
        let label = if query.trim().is_empty() { "Image" } else { query.trim() };
        let url = match Url::parse(PLACEHOLDER_BASE) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("text", label);
                url.to_string()
            }
            Err(_) => PLACEHOLDER_BASE.to_string(),
        };
        Self {
            url,
            caption: format!("{label} ({})", index + 1),
            source: "placeholder".to_string(),
            photographer: None,
            photographer_url: None,
        }
    }
}

/// Stock photo batch size for the next source: a third of what's missing, at least one.
pub fn stock_batch_size(remaining: usize) -> usize {
    remaining.div_ceil(3).max(1)
}

#[derive(Clone)]
pub struct ImageResolver {
    captioner: Arc<dyn ImageCaptioner>,
    sources: Vec<Arc<dyn StockPhotoSource>>,
}

impl ImageResolver {
    pub fn new(captioner: Arc<dyn ImageCaptioner>, sources: Vec<Arc<dyn StockPhotoSource>>) -> Self {
        Self { captioner, sources }
    }

    /// Return exactly `required` images for a post about `query`.
    #[instrument(skip(self, user_images), fields(user_images = user_images.len()))]
    pub async fn resolve(&self, required: usize, user_images: &[String], query: &str) -> Vec<ImageDescriptor> {
        if required == 0 {
            return Vec::new();
        }

        let mut images = self.caption_uploads(&user_images[..user_images.len().min(required)]).await;

        for source in &self.sources {
            let remaining = required - images.len();
            if remaining == 0 {
                break;
            }
            let batch = stock_batch_size(remaining);
            match source.search(query, batch).await {
                Ok(photos) => {
                    debug!("{} returned {} of {} requested photos", source.name(), photos.len(), batch);
                    images.extend(photos.into_iter().take(remaining).map(|photo| ImageDescriptor {
                        caption: photo.description.unwrap_or_else(|| query.to_string()),
                        url: photo.url,
                        source: source.name().to_string(),
                        photographer: photo.photographer,
                        photographer_url: photo.photographer_url,
                    }));
                }
                Err(e) => warn!("Stock photo search on {} failed: {:#}", source.name(), e),
            }
        }

        while images.len() < required {
            images.push(ImageDescriptor::placeholder(query, images.len()));
        }
        images
    }

    async fn caption_uploads(&self, uploads: &[String]) -> Vec<ImageDescriptor> {
        let captions = join_all(uploads.iter().map(|url| self.captioner.caption(url))).await;
        uploads
            .iter()
            .zip(captions)
            .map(|(url, caption)| {
                let caption = caption.unwrap_or_else(|e| {
                    warn!("Captioning uploaded image failed: {:#}", e);
                    UPLOAD_CAPTION_FALLBACK.to_string()
                });
                ImageDescriptor {
                    url: url.clone(),
                    caption,
                    source: "user".to_string(),
                    photographer: None,
                    photographer_url: None,
                }
            })
            .collect()
    }
}
