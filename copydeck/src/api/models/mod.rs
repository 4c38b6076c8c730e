//! API request and response data models.
//!
//! Request bodies are deserialized leniently and then checked once by a `validate` step that
//! produces the typed values the handlers work with. Response bodies use camelCase and are
//! wrapped in `{success, data}` via [`ApiResponse`].

pub mod generate;
pub mod history;
pub mod pagination;
pub mod profiles;
pub mod users;
pub mod youtube;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Success envelope used by every JSON route.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

/// A keyword list given either as an array or as one comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum KeywordsInput {
    List(Vec<String>),
    Text(String),
}

impl Default for KeywordsInput {
    fn default() -> Self {
        KeywordsInput::List(Vec::new())
    }
}

impl KeywordsInput {
    /// Trimmed, non-empty keywords in their original order.
    pub fn normalized(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            KeywordsInput::List(list) => list.iter().map(String::as_str).collect(),
            KeywordsInput::Text(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Trim an optional free-text field, treating blank as absent.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_accept_list_or_comma_string() {
        let list: KeywordsInput = serde_json::from_str(r#"["coffee", " beans ", ""]"#).unwrap();
        assert_eq!(list.normalized(), ["coffee", "beans"]);

        let text: KeywordsInput = serde_json::from_str(r#""coffee, beans,,roastery ""#).unwrap();
        assert_eq!(text.normalized(), ["coffee", "beans", "roastery"]);
    }
}
