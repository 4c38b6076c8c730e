//! Common type definitions shared by the API, database and pipeline layers.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`UserId`]: Supabase auth user identifier (also the `users` primary key)
//! - [`ContentId`]: Content generation history row
//! - [`ProfileId`]: Saved brand profile
//! - [`AnalysisId`]: YouTube analysis history row
//!
//! # Domain enums
//!
//! - [`Platform`]: Target social media format for generated copy
//! - [`AiModel`]: Which LLM backend writes the copy
//! - [`Tier`]: Account plan, governs monthly credit resets
//! - [`AnalysisType`]: YouTube analysis flavour, governs cache TTL and price

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};
use utoipa::ToSchema;
use uuid::Uuid;

pub type UserId = Uuid;
pub type ContentId = Uuid;
pub type ProfileId = Uuid;
pub type AnalysisId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// A target social media format. Each platform has its own prompt and output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Blog,
    Instagram,
    Threads,
    Youtube,
}

impl Platform {
    pub const ALL: [Platform; 4] = [Platform::Blog, Platform::Instagram, Platform::Threads, Platform::Youtube];

    /// Number of images a post for this platform uses.
    pub fn image_slots(self) -> usize {
        match self {
            Platform::Blog => 3,
            Platform::Instagram => 3,
            Platform::Threads => 1,
            Platform::Youtube => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Blog => "blog",
            Platform::Instagram => "instagram",
            Platform::Threads => "threads",
            Platform::Youtube => "youtube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blog" => Ok(Platform::Blog),
            "instagram" => Ok(Platform::Instagram),
            "threads" => Ok(Platform::Threads),
            "youtube" => Ok(Platform::Youtube),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// LLM backend used to write copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AiModel {
    #[default]
    #[serde(alias = "gpt", alias = "gpt-4o", alias = "gpt-4o-mini", alias = "chatgpt")]
    Openai,
    #[serde(alias = "gemini-pro", alias = "gemini-flash")]
    Gemini,
}

impl AiModel {
    pub fn as_str(self) -> &'static str {
        match self {
            AiModel::Openai => "openai",
            AiModel::Gemini => "gemini",
        }
    }
}

impl fmt::Display for AiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account plan. Only the free tier gets its credits topped up monthly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Business,
}

/// Kind of YouTube analysis. Each kind has a fixed cache TTL and credit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Summary,
    Seo,
    Engagement,
    Comments,
}

impl AnalysisType {
    /// How long a cached result stays fresh. Comment sentiment moves fastest, the
    /// content summary of a published video barely moves at all.
    pub fn ttl(self) -> Duration {
        const HOUR: u64 = 60 * 60;
        match self {
            AnalysisType::Summary => Duration::from_secs(72 * HOUR),
            AnalysisType::Seo => Duration::from_secs(24 * HOUR),
            AnalysisType::Engagement => Duration::from_secs(12 * HOUR),
            AnalysisType::Comments => Duration::from_secs(6 * HOUR),
        }
    }

    /// Credits charged for an uncached analysis.
    pub fn credit_cost(self) -> i32 {
        match self {
            AnalysisType::Summary | AnalysisType::Engagement => 1,
            AnalysisType::Seo | AnalysisType::Comments => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Summary => "summary",
            AnalysisType::Seo => "seo",
            AnalysisType::Engagement => "engagement",
            AnalysisType::Comments => "comments",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(AnalysisType::Summary),
            "seo" => Ok(AnalysisType::Seo),
            "engagement" => Ok(AnalysisType::Engagement),
            "comments" => Ok(AnalysisType::Comments),
            other => Err(format!("unknown analysis type '{other}'")),
        }
    }
}
