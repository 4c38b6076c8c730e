//! `/api/youtube/*` bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::PageQuery;
use crate::db::models::youtube::{AnalysisHistoryDBResponse, AnalysisStatsDBResponse};
use crate::errors::Error;
use crate::providers::VideoInfo;
use crate::types::{AnalysisId, AnalysisType};
use crate::youtube::extract_video_id;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Any YouTube watch, share, embed or shorts URL, or a bare video id
    #[serde(default)]
    pub video_url: String,
    /// One of `summary`, `seo`, `engagement`, `comments`
    #[serde(default)]
    pub analysis_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAnalyze {
    pub video_id: String,
    pub video_url: String,
    pub analysis_type: AnalysisType,
}

impl AnalyzeRequest {
    pub fn validate(&self) -> Result<ValidatedAnalyze, Error> {
        let video_url = self.video_url.trim();
        if video_url.is_empty() {
            return Err(Error::BadRequest {
                message: "videoUrl is required".to_string(),
            });
        }
        let analysis_type = self
            .analysis_type
            .parse::<AnalysisType>()
            .map_err(|e| Error::BadRequest { message: e })?;
        let video_id = extract_video_id(video_url).ok_or_else(|| Error::InvalidVideoUrl {
            url: video_url.to_string(),
        })?;
        Ok(ValidatedAnalyze {
            video_id,
            video_url: video_url.to_string(),
            analysis_type,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub video_id: String,
    pub video_info: VideoInfo,
    #[schema(value_type = Object)]
    pub analysis_result: Value,
    pub ai_summary: String,
    /// Zero when served from cache
    pub credits_used: i32,
    pub was_cached: bool,
    pub cache_expires_at: DateTime<Utc>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnalysisHistoryQuery {
    /// Page number, starting at 1 (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<i64>,
    /// Items per page (default: 10, max: 50)
    #[param(default = 10, minimum = 1, maximum = 50)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
    /// Only return analyses of this type
    #[serde(default)]
    pub analysis_type: Option<String>,
}

impl AnalysisHistoryQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn analysis_type(&self) -> Result<Option<AnalysisType>, Error> {
        match self.analysis_type.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|e| Error::BadRequest { message: e }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisHistoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AnalysisId,
    pub video_id: String,
    pub video_url: String,
    pub analysis_type: AnalysisType,
    pub video_title: Option<String>,
    /// The cached payload as returned by the analyze call
    #[schema(value_type = Object)]
    pub result: Value,
    pub credits_used: i32,
    pub was_cached: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisHistoryDBResponse> for AnalysisHistoryResponse {
    fn from(row: AnalysisHistoryDBResponse) -> Self {
        Self {
            id: row.id,
            video_id: row.video_id,
            video_url: row.video_url,
            analysis_type: row.analysis_type,
            video_title: row.video_title,
            result: row.payload,
            credits_used: row.credits_used,
            was_cached: row.was_cached,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStatsResponse {
    pub total_analyses: i64,
    pub cached_analyses: i64,
    pub credits_spent: i64,
    /// Analysis count per type
    pub by_type: BTreeMap<String, i64>,
}

impl From<AnalysisStatsDBResponse> for AnalysisStatsResponse {
    fn from(stats: AnalysisStatsDBResponse) -> Self {
        Self {
            total_analyses: stats.total_analyses,
            cached_analyses: stats.cached_analyses,
            credits_spent: stats.credits_spent,
            by_type: stats.by_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_analyze() {
        let ok = AnalyzeRequest {
            video_url: " https://youtu.be/dQw4w9WgXcQ ".to_string(),
            analysis_type: "SEO".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.video_id, "dQw4w9WgXcQ");
        assert_eq!(ok.analysis_type, AnalysisType::Seo);

        let bad_type = AnalyzeRequest {
            video_url: "dQw4w9WgXcQ".to_string(),
            analysis_type: "vibes".to_string(),
        };
        assert_eq!(bad_type.validate().unwrap_err().code(), "INVALID_INPUT");

        let bad_url = AnalyzeRequest {
            video_url: "https://vimeo.com/123".to_string(),
            analysis_type: "summary".to_string(),
        };
        assert_eq!(bad_url.validate().unwrap_err().code(), "INVALID_VIDEO_URL");
    }
}
