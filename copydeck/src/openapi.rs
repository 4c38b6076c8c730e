//! OpenAPI document for the `/api` surface, served at `/openapi.json` and browsable at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Supabase access token of the signed-in user:\n\n\
                            ```\nAuthorization: Bearer <access_token>\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::generate::generate,
        api::handlers::youtube::analyze_video,
        api::handlers::youtube::list_analyses,
        api::handlers::youtube::get_analysis,
        api::handlers::youtube::delete_analysis,
        api::handlers::youtube::analysis_stats,
        api::handlers::users::get_credits,
        api::handlers::users::complete_onboarding,
        api::handlers::history::list_content,
        api::handlers::history::get_content,
        api::handlers::history::delete_content,
        api::handlers::profiles::list_profiles,
        api::handlers::profiles::create_profile,
        api::handlers::profiles::get_profile,
        api::handlers::profiles::update_profile,
        api::handlers::profiles::delete_profile,
    ),
    components(
        schemas(
            api::models::KeywordsInput,
            api::models::generate::GenerateRequest,
            api::models::generate::GenerateResponse,
            api::models::generate::GeneratedContent,
            api::models::generate::ImageInput,
            api::models::youtube::AnalyzeRequest,
            api::models::youtube::AnalyzeResponse,
            api::models::youtube::AnalysisHistoryResponse,
            api::models::youtube::AnalysisStatsResponse,
            api::models::users::CreditsResponse,
            api::models::users::UserResponse,
            api::models::history::ContentHistoryResponse,
            api::models::profiles::ProfileRequest,
            api::models::profiles::ProfileResponse,
            crate::generation::PlatformContent,
            crate::generation::GenerationStatus,
            crate::images::ImageDescriptor,
            crate::providers::VideoInfo,
            crate::types::Platform,
            crate::types::AiModel,
            crate::types::Tier,
            crate::types::AnalysisType,
            crate::errors::ErrorBody,
        )
    ),
    tags(
        (name = "generate", description = "Platform-specific marketing copy from a brand brief and images. \
            Signed-in users pay credits per platform that succeeds; guests get a one-time trial per IP address."),
        (name = "youtube", description = "Video analysis (summary, SEO, engagement, comments) with a shared result cache. \
            Cache hits are free."),
        (name = "users", description = "Credit balances and first-login onboarding."),
        (name = "history", description = "Past generations of the signed-in user."),
        (name = "profiles", description = "Saved brand presets."),
    ),
    info(
        title = "Copydeck API",
        version = "1.0.0",
        description = "Marketing content generation and YouTube video analysis.

## Authentication

Every endpoint except `POST /api/generate` requires a Supabase access token:

```
Authorization: Bearer <access_token>
```

## Errors

Failures return `{success: false, error, code}` with an optional `message`. Running out of credits
returns `403` with code `INSUFFICIENT_CREDITS` and a `redirect` to the pricing page.",
    ),
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_all_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/generate",
            "/api/youtube/analyze",
            "/api/youtube/history",
            "/api/youtube/history/{id}",
            "/api/youtube/stats",
            "/api/user/credits",
            "/api/user/onboarding",
            "/api/history",
            "/api/history/{id}",
            "/api/profiles",
            "/api/profiles/{id}",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
    }

    #[test]
    fn test_row_ids_are_documented_as_uuid_strings() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        for schema in ["ContentHistoryResponse", "ProfileResponse", "UserResponse", "AnalysisHistoryResponse"] {
            let id = &doc["components"]["schemas"][schema]["properties"]["id"];
            assert_eq!(id["type"], "string", "{schema}.id");
            assert_eq!(id["format"], "uuid", "{schema}.id");
        }
    }
}
