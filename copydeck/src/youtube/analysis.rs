//! The uncached analysis path: fetch video data, compute metrics, ask the model for a summary.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::errors::{Error, Result, Upstream};
use crate::providers::{Prompt, TextGenerator, VideoComment, VideoDataSource, VideoInfo};
use crate::types::AnalysisType;

const DESCRIPTION_EXCERPT_CHARS: usize = 500;
const COMMENTS_IN_PROMPT: usize = 30;

/// What gets cached and returned for one (video, analysis type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub video_info: VideoInfo,
    /// Metrics computed from the video data; shape depends on the analysis type
    #[schema(value_type = Object)]
    pub analysis_result: Value,
    pub ai_summary: String,
}

pub struct VideoAnalyzer<'a> {
    videos: &'a dyn VideoDataSource,
    generator: &'a dyn TextGenerator,
    max_comments: u32,
}

impl<'a> VideoAnalyzer<'a> {
    pub fn new(videos: &'a dyn VideoDataSource, generator: &'a dyn TextGenerator, max_comments: u32) -> Self {
        Self {
            videos,
            generator,
            max_comments,
        }
    }

    #[instrument(skip(self))]
    pub async fn analyze(&self, video_id: &str, analysis_type: AnalysisType) -> Result<AnalysisPayload> {
        let video = self
            .videos
            .video(video_id)
            .await
            .map_err(|e| youtube_error(&e))?
            .ok_or_else(|| Error::NotFound {
                resource: "Video".to_string(),
                id: video_id.to_string(),
            })?;

        let comments = match analysis_type {
            AnalysisType::Comments => self
                .videos
                .comments(video_id, self.max_comments)
                .await
                .map_err(|e| youtube_error(&e))?,
            _ => Vec::new(),
        };

        let analysis_result = match analysis_type {
            AnalysisType::Summary => summary_metrics(&video),
            AnalysisType::Seo => seo_metrics(&video),
            AnalysisType::Engagement => engagement_metrics(&video),
            AnalysisType::Comments => comment_metrics(&comments),
        };

        let prompt = analysis_prompt(analysis_type, &video, &analysis_result, &comments);
        let ai_summary = self.generator.generate(&prompt).await.map_err(|e| Error::Upstream {
            service: self.generator.upstream(),
            message: format!("{e:#}"),
        })?;

        info!("Analyzed video {} ({})", video_id, analysis_type);
        Ok(AnalysisPayload {
            video_info: video,
            analysis_result,
            ai_summary,
        })
    }
}

fn youtube_error(e: &anyhow::Error) -> Error {
    Error::Upstream {
        service: Upstream::YouTube,
        message: format!("{e:#}"),
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Percentage of `part` in `whole`, two decimals, zero when `whole` is zero.
fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

fn summary_metrics(video: &VideoInfo) -> Value {
    json!({
        "title": video.title,
        "channelTitle": video.channel_title,
        "publishedAt": video.published_at,
        "duration": video.duration,
        "descriptionExcerpt": excerpt(&video.description, DESCRIPTION_EXCERPT_CHARS),
    })
}

fn seo_metrics(video: &VideoInfo) -> Value {
    let title_length = video.title.chars().count();
    let description_length = video.description.chars().count();
    let has_timestamps = video.description.contains("0:00");
    let has_links = video.description.contains("http://") || video.description.contains("https://");

    let mut recommendations = Vec::new();
    if !(30..=70).contains(&title_length) {
        recommendations.push("Keep the title between 30 and 70 characters");
    }
    if description_length < 200 {
        recommendations.push("Write a description of at least 200 characters");
    }
    if video.tags.len() < 5 {
        recommendations.push("Add at least 5 relevant tags");
    }
    if !has_timestamps {
        recommendations.push("Add chapter timestamps starting at 0:00");
    }

    json!({
        "titleLength": title_length,
        "descriptionLength": description_length,
        "tagCount": video.tags.len(),
        "tags": video.tags,
        "hasTimestamps": has_timestamps,
        "hasLinks": has_links,
        "recommendations": recommendations,
    })
}

fn engagement_metrics(video: &VideoInfo) -> Value {
    json!({
        "viewCount": video.view_count,
        "likeCount": video.like_count,
        "commentCount": video.comment_count,
        "likeRate": rate(video.like_count, video.view_count),
        "commentRate": rate(video.comment_count, video.view_count),
        "engagementRate": rate(video.like_count + video.comment_count, video.view_count),
    })
}

fn comment_metrics(comments: &[VideoComment]) -> Value {
    let total_likes: u64 = comments.iter().map(|c| c.like_count).sum();
    let mut top: Vec<&VideoComment> = comments.iter().collect();
    top.sort_by(|a, b| b.like_count.cmp(&a.like_count));
    top.truncate(5);

    json!({
        "sampledComments": comments.len(),
        "averageLikes": if comments.is_empty() { 0.0 } else { total_likes as f64 / comments.len() as f64 },
        "topComments": top,
    })
}

fn analysis_prompt(analysis_type: AnalysisType, video: &VideoInfo, metrics: &Value, comments: &[VideoComment]) -> Prompt {
    let task = match analysis_type {
        AnalysisType::Summary => "Summarize what this video is about in 3 to 5 sentences and list its key takeaways.",
        AnalysisType::Seo => "Review the SEO of this video's title, description and tags and suggest concrete improvements.",
        AnalysisType::Engagement => "Interpret these engagement numbers and suggest how the creator could improve them.",
        AnalysisType::Comments => {
            "Describe the overall sentiment of these comments, the recurring themes, and questions the creator should answer."
        }
    };

    let mut user = format!(
        "Video title: {}\nChannel: {}\nDescription: {}\nMetrics: {}\n",
        video.title,
        video.channel_title,
        excerpt(&video.description, DESCRIPTION_EXCERPT_CHARS),
        metrics
    );
    if !comments.is_empty() {
        user.push_str("Comments:\n");
        for comment in comments.iter().take(COMMENTS_IN_PROMPT) {
            user.push_str(&format!("- {}\n", comment.text.replace('\n', " ")));
        }
    }
    user.push('\n');
    user.push_str(task);

    Prompt {
        system: "You are a YouTube growth strategist. Be specific and concise.".to_string(),
        user,
        max_tokens: 700,
        temperature: 0.4,
    }
}
