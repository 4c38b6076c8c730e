//! YouTube Data API v3 client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use tracing::instrument;
use url::Url;

use super::{VideoComment, VideoDataSource, VideoInfo, ensure_slash, error_for_status};
use crate::config::YoutubeConfig;

pub struct YoutubeClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl YoutubeClient {
    pub fn new(client: Client, config: &YoutubeConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> anyhow::Result<Url> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("YouTube API key is not configured"))?;
        let mut url = ensure_slash(&self.base_url).join(resource)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("key", api_key);
        }
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

// The API sends counters as decimal strings and omits hidden ones.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    view_count: Option<u64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    like_count: Option<u64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    comment_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    author_display_name: String,
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    like_count: u64,
}

impl From<VideoResource> for VideoInfo {
    fn from(video: VideoResource) -> Self {
        let thumbnail_url = video
            .snippet
            .thumbnails
            .and_then(|thumbs| thumbs.high.or(thumbs.default))
            .map(|thumb| thumb.url);
        Self {
            video_id: video.id,
            title: video.snippet.title,
            description: video.snippet.description,
            channel_title: video.snippet.channel_title,
            published_at: video.snippet.published_at,
            tags: video.snippet.tags,
            duration: video.content_details.and_then(|details| details.duration),
            view_count: video.statistics.view_count.unwrap_or_default(),
            like_count: video.statistics.like_count.unwrap_or_default(),
            comment_count: video.statistics.comment_count.unwrap_or_default(),
            thumbnail_url,
        }
    }
}

#[async_trait]
impl VideoDataSource for YoutubeClient {
    #[instrument(skip(self))]
    async fn video(&self, video_id: &str) -> anyhow::Result<Option<VideoInfo>> {
        let url = self.endpoint("videos", &[("part", "snippet,statistics,contentDetails"), ("id", video_id)])?;
        let response = self.client.get(url).send().await?;
        let body: ListResponse<VideoResource> = error_for_status("YouTube", response).await?.json().await?;
        Ok(body.items.into_iter().next().map(VideoInfo::from))
    }

    #[instrument(skip(self))]
    async fn comments(&self, video_id: &str, max_results: u32) -> anyhow::Result<Vec<VideoComment>> {
        let max_results = max_results.clamp(1, 100).to_string();
        let url = self.endpoint(
            "commentThreads",
            &[
                ("part", "snippet"),
                ("videoId", video_id),
                ("maxResults", &max_results),
                ("order", "relevance"),
                ("textFormat", "plainText"),
            ],
        )?;
        let response = self.client.get(url).send().await?;
        let body: ListResponse<CommentThread> = error_for_status("YouTube", response).await?.json().await?;
        Ok(body
            .items
            .into_iter()
            .map(|thread| {
                let snippet = thread.snippet.top_level_comment.snippet;
                VideoComment {
                    author: snippet.author_display_name,
                    text: snippet.text_display,
                    like_count: snippet.like_count,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_http_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> YoutubeClient {
        let config = YoutubeConfig {
            api_key: Some("yt-key".to_string()),
            base_url: Url::parse(&format!("{}/youtube/v3", server.uri())).unwrap(),
            max_comments: 20,
        };
        YoutubeClient::new(test_http_client(), &config)
    }

    #[tokio::test]
    async fn test_video_parses_string_counters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("id", "dQw4w9WgXcQ"))
            .and(query_param("key", "yt-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "id": "dQw4w9WgXcQ",
                    "snippet": {
                        "title": "Launch day",
                        "channelTitle": "Roastery",
                        "tags": ["coffee"],
                        "thumbnails": {"high": {"url": "https://i.ytimg.com/hq.jpg"}}
                    },
                    "statistics": {"viewCount": "1500", "likeCount": "42"},
                    "contentDetails": {"duration": "PT4M13S"}
                }]
            })))
            .mount(&server)
            .await;

        let info = client_for(&server).video("dQw4w9WgXcQ").await.unwrap().unwrap();
        assert_eq!(info.title, "Launch day");
        assert_eq!(info.view_count, 1500);
        assert_eq!(info.like_count, 42);
        assert_eq!(info.comment_count, 0);
        assert_eq!(info.duration.as_deref(), Some("PT4M13S"));
        assert_eq!(info.thumbnail_url.as_deref(), Some("https://i.ytimg.com/hq.jpg"));
    }

    #[tokio::test]
    async fn test_unknown_video_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        assert!(client_for(&server).video("aaaaaaaaaaa").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/commentThreads"))
            .and(query_param("videoId", "dQw4w9WgXcQ"))
            .and(query_param("maxResults", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"snippet": {"topLevelComment": {"snippet": {
                    "authorDisplayName": "viewer", "textDisplay": "great video", "likeCount": 3
                }}}}]
            })))
            .mount(&server)
            .await;

        let comments = client_for(&server).comments("dQw4w9WgXcQ", 20).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "great video");
        assert_eq!(comments[0].like_count, 3);
    }
}
