//! Saved brand presets that pre-fill the generation form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{KeywordsInput, non_blank};
use crate::db::models::profiles::{ProfileDBRequest, ProfileDBResponse};
use crate::errors::Error;
use crate::types::ProfileId;

/// Body for both create and full update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub target_age: Option<String>,
    #[serde(default)]
    pub keywords: KeywordsInput,
}

impl ProfileRequest {
    pub fn validate(&self) -> Result<ProfileDBRequest, Error> {
        let name = self.name.trim();
        let brand = self.brand.trim();
        if name.is_empty() || brand.is_empty() {
            return Err(Error::BadRequest {
                message: "Profile name and brand are required".to_string(),
            });
        }
        Ok(ProfileDBRequest {
            name: name.to_string(),
            brand: brand.to_string(),
            industry: non_blank(&self.industry),
            tone: non_blank(&self.tone),
            target_age: non_blank(&self.target_age),
            keywords: self.keywords.normalized(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProfileId,
    pub name: String,
    pub brand: String,
    pub industry: Option<String>,
    pub tone: Option<String>,
    pub target_age: Option<String>,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileDBResponse> for ProfileResponse {
    fn from(row: ProfileDBResponse) -> Self {
        Self {
            id: row.id,
            name: row.name,
            brand: row.brand,
            industry: row.industry,
            tone: row.tone,
            target_age: row.target_age,
            keywords: row.keywords,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
