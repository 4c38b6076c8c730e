//! Prompt templates for each platform.

use super::ContentBrief;
use crate::images::ImageDescriptor;
use crate::providers::Prompt;
use crate::types::Platform;

const SYSTEM_PROMPT: &str = "You are a senior marketing copywriter. You write native-sounding copy for each social \
platform, never invent facts about the brand, and answer with the finished copy only, without preamble.";

fn platform_instructions(platform: Platform) -> &'static str {
    match platform {
        Platform::Blog => {
            "Write an SEO-friendly blog post of 800 to 1200 words in Markdown. Start with a `# ` title line, \
use `## ` section headings, weave the keywords in naturally and close with a call to action."
        }
        Platform::Instagram => {
            "Write an Instagram carousel caption under 2200 characters. Open with a hook line, use short \
paragraphs and a few emojis, add one line per carousel slide describing the matching image, and end \
with 10 to 15 relevant hashtags."
        }
        Platform::Threads => {
            "Write a single Threads post under 500 characters. Keep it conversational, ask the reader a \
question and use at most 3 hashtags."
        }
        Platform::Youtube => {
            "Write a YouTube video title (first line, under 70 characters) followed by a description with a \
short summary, chapter timestamps starting at 0:00, a call to subscribe, and a final `Tags:` line with \
comma-separated tags."
        }
    }
}

/// Upper bound on response length for each platform.
pub fn max_tokens(platform: Platform) -> u32 {
    match platform {
        Platform::Blog => 2000,
        Platform::Instagram => 800,
        Platform::Threads => 300,
        Platform::Youtube => 1000,
    }
}

pub fn platform_prompt(platform: Platform, brief: &ContentBrief, images: &[ImageDescriptor]) -> Prompt {
    let mut user = format!("Brand: {}\n", brief.brand);
    if !brief.keywords.is_empty() {
        user.push_str(&format!("Keywords: {}\n", brief.keywords.join(", ")));
    }
    if let Some(industry) = &brief.industry {
        user.push_str(&format!("Industry: {industry}\n"));
    }
    if let Some(target_age) = &brief.target_age {
        user.push_str(&format!("Target audience age: {target_age}\n"));
    }
    user.push_str(&format!("Tone: {}\n", brief.tone.as_deref().unwrap_or("friendly and professional")));

    let slots = platform.image_slots().min(images.len());
    if slots > 0 {
        user.push_str("Images that will accompany the post:\n");
        for (i, image) in images.iter().take(slots).enumerate() {
            user.push_str(&format!("{}. {}\n", i + 1, image.caption));
        }
    }

    user.push('\n');
    user.push_str(platform_instructions(platform));

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
        max_tokens: max_tokens(platform),
        temperature: 0.7,
    }
}
