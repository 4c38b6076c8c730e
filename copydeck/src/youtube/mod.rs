//! YouTube analyzer: URL parsing, the analysis pipeline and its read-through cache.

pub mod analysis;
pub mod cache;

use url::Url;

const VIDEO_ID_LEN: usize = 11;

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Pull the 11-character video id out of a YouTube URL or a bare id.
///
/// Accepts `youtube.com/watch?v=ID` (with or without `www.` / `m.`), `youtu.be/ID`,
/// `youtube.com/embed/ID` and `youtube.com/shorts/ID`. The scheme may be omitted.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if is_video_id(input) {
        return Some(input.to_string());
    }

    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{input}")).ok()?,
        Err(_) => return None,
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());

    let candidate = match host.as_str() {
        "youtu.be" | "www.youtu.be" => segments.next()?.to_string(),
        "youtube.com" | "www.youtube.com" | "m.youtube.com" => match segments.next()? {
            "watch" => url.query_pairs().find(|(key, _)| key == "v")?.1.into_owned(),
            "embed" | "shorts" => segments.next()?.to_string(),
            _ => return None,
        },
        _ => return None,
    };

    is_video_id(&candidate).then_some(candidate)
}
