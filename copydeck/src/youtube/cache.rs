//! Read-through cache for analysis results, keyed by (video id, analysis type).
//!
//! A row is served only while `now < expires_at`. Serving a row bumps its hit counter in a
//! detached task whose failure is only logged. Misses are filled by the caller via
//! [`AnalysisCache::put`], which stamps `expires_at = now + ttl(analysis_type)`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::db::{
    errors::DbError,
    models::youtube::{AnalysisCacheDBResponse, AnalysisCacheUpsertDBRequest},
    store::{AnalysisCacheStore, Store},
};
use crate::errors::Result;
use crate::types::AnalysisType;

#[derive(Clone)]
pub struct AnalysisCache {
    store: Arc<dyn Store>,
}

impl AnalysisCache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The fresh cached row for this key, if any.
    pub async fn get(&self, video_id: &str, analysis_type: AnalysisType, now: DateTime<Utc>) -> Result<Option<AnalysisCacheDBResponse>> {
        let Some(entry) = self.store.get_cached_analysis(video_id, analysis_type).await? else {
            debug!("Analysis cache miss for {}/{}", video_id, analysis_type);
            return Ok(None);
        };

        if now >= entry.expires_at {
            debug!("Analysis cache entry for {}/{} expired at {}", video_id, analysis_type, entry.expires_at);
            return Ok(None);
        }

        let store = self.store.clone();
        let key = video_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.increment_cache_hits(&key, analysis_type).await {
                warn!("Failed to record analysis cache hit for {}/{}: {}", key, analysis_type, e);
            }
        });

        debug!("Analysis cache hit for {}/{}", video_id, analysis_type);
        Ok(Some(entry))
    }

    /// Store a fresh result, replacing whatever was there.
    pub async fn put(
        &self,
        video_id: &str,
        analysis_type: AnalysisType,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<AnalysisCacheDBResponse> {
        let ttl = chrono::Duration::from_std(analysis_type.ttl()).map_err(|e| DbError::Other(e.into()))?;
        let request = AnalysisCacheUpsertDBRequest {
            video_id: video_id.to_string(),
            analysis_type,
            payload,
            expires_at: now + ttl,
        };
        Ok(self.store.upsert_cached_analysis(&request).await?)
    }

    /// Drop expired rows. Intended for an external cleanup job.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        Ok(self.store.purge_expired_analyses(now).await?)
    }
}
