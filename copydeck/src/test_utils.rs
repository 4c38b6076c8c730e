//! Fakes for the external services and helpers for building a test server over the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    AppState,
    auth::session::{AccessTokenClaims, create_access_token},
    config::{AuthConfig, Config},
    db::{memory::MemoryStore, models::users::UserDBResponse, store::UserStore},
    errors::Upstream,
    providers::{ImageCaptioner, Prompt, Providers, StockPhoto, StockPhotoSource, TextGenerator, VideoComment, VideoDataSource, VideoInfo},
    types::{Tier, UserId},
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-testing-only";

/// HTTP client for provider tests, built the same way as in production so the rustls provider is installed.
pub fn test_http_client() -> reqwest::Client {
    crate::providers::http_client(std::time::Duration::from_secs(5)).expect("Failed to build HTTP client")
}

/// Text generator that echoes the first line of the prompt, or fails when the prompt contains a needle.
pub struct FakeTextGenerator {
    upstream: Upstream,
    fail_when: Option<String>,
    spends_balance_of: Option<(MemoryStore, UserId)>,
    calls: AtomicUsize,
}

impl FakeTextGenerator {
    pub fn ok() -> Self {
        Self {
            upstream: Upstream::OpenAi,
            fail_when: None,
            spends_balance_of: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every prompt whose user message contains `needle`. An empty needle fails everything.
    pub fn failing_when(needle: &str) -> Self {
        Self {
            fail_when: Some(needle.to_string()),
            ..Self::ok()
        }
    }

    /// Empties `user_id`'s balance in `store` on every call, as a concurrent request would.
    pub fn spending_balance_of(mut self, store: MemoryStore, user_id: UserId) -> Self {
        self.spends_balance_of = Some((store, user_id));
        self
    }

    pub fn attributed_to(mut self, upstream: Upstream) -> Self {
        self.upstream = upstream;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    fn upstream(&self) -> Upstream {
        self.upstream
    }

    async fn generate(&self, prompt: &Prompt) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((store, user_id)) = &self.spends_balance_of {
            if let Some(mut user) = store.get_user(*user_id).await? {
                user.free_credits = 0;
                user.paid_credits = 0;
                store.put_user(user);
            }
        }
        if self.fail_when.as_deref().is_some_and(|needle| prompt.user.contains(needle)) {
            anyhow::bail!("model unavailable");
        }
        let first_line = prompt.user.lines().next().unwrap_or_default();
        Ok(format!("Generated copy: {first_line} #launch #coffee"))
    }
}

pub struct FakeCaptioner {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeCaptioner {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageCaptioner for FakeCaptioner {
    async fn caption(&self, image_url: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("vision model unavailable");
        }
        Ok(format!("caption for {image_url}"))
    }
}

/// Stock source that returns a fixed number of photos regardless of the requested count.
pub struct FakeStockSource {
    name: &'static str,
    results: Option<usize>,
    requests: Mutex<Vec<(String, usize)>>,
}

impl FakeStockSource {
    pub fn returning(name: &'static str, results: usize) -> Self {
        Self {
            name,
            results: Some(results),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            results: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl StockPhotoSource for FakeStockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, query: &str, count: usize) -> anyhow::Result<Vec<StockPhoto>> {
        self.requests.lock().push((query.to_string(), count));
        let Some(results) = self.results else {
            anyhow::bail!("{} API error: 503 Service Unavailable", self.name);
        };
        Ok((0..results)
            .map(|i| StockPhoto {
                url: format!("https://{}.example/{i}.jpg", self.name),
                description: Some(format!("{query} photo {i}")),
                photographer: Some("Photographer".to_string()),
                photographer_url: None,
            })
            .collect())
    }
}

pub fn sample_video(video_id: &str) -> VideoInfo {
    VideoInfo {
        video_id: video_id.to_string(),
        title: "How we roast our single origin beans".to_string(),
        description: "A look inside the roastery.\n0:00 Intro\n1:30 Roasting\nhttps://bean.example".to_string(),
        channel_title: "Bean & Leaf".to_string(),
        published_at: Some("2025-01-15T10:00:00Z".to_string()),
        tags: vec!["coffee".to_string(), "roasting".to_string()],
        duration: Some("PT8M2S".to_string()),
        view_count: 1000,
        like_count: 50,
        comment_count: 10,
        thumbnail_url: Some(format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg")),
    }
}

enum VideoBehaviour {
    Video(VideoInfo),
    Missing,
    Failing,
}

pub struct FakeVideoSource {
    behaviour: VideoBehaviour,
    video_requests: AtomicUsize,
    comment_requests: Mutex<Vec<u32>>,
}

impl FakeVideoSource {
    fn new(behaviour: VideoBehaviour) -> Self {
        Self {
            behaviour,
            video_requests: AtomicUsize::new(0),
            comment_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_video(video: VideoInfo) -> Self {
        Self::new(VideoBehaviour::Video(video))
    }

    pub fn empty() -> Self {
        Self::new(VideoBehaviour::Missing)
    }

    pub fn failing() -> Self {
        Self::new(VideoBehaviour::Failing)
    }

    pub fn video_requests(&self) -> usize {
        self.video_requests.load(Ordering::SeqCst)
    }

    pub fn comment_requests(&self) -> Vec<u32> {
        self.comment_requests.lock().clone()
    }
}

#[async_trait]
impl VideoDataSource for FakeVideoSource {
    async fn video(&self, video_id: &str) -> anyhow::Result<Option<VideoInfo>> {
        self.video_requests.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            VideoBehaviour::Video(video) if video.video_id == video_id => Ok(Some(video.clone())),
            VideoBehaviour::Video(_) | VideoBehaviour::Missing => Ok(None),
            VideoBehaviour::Failing => anyhow::bail!("YouTube API error: 403 Forbidden - quotaExceeded"),
        }
    }

    async fn comments(&self, _video_id: &str, max_results: u32) -> anyhow::Result<Vec<VideoComment>> {
        self.comment_requests.lock().push(max_results);
        if matches!(self.behaviour, VideoBehaviour::Failing) {
            anyhow::bail!("YouTube API error: 403 Forbidden - commentsDisabled");
        }
        Ok(vec![
            VideoComment {
                author: "viewer one".to_string(),
                text: "What grinder do you use?".to_string(),
                like_count: 2,
            },
            VideoComment {
                author: "viewer two".to_string(),
                text: "Love the pour-over tips".to_string(),
                like_count: 12,
            },
        ])
    }
}

/// Fakes wired into a test server, kept so tests can inspect what was called.
pub struct TestProviders {
    pub openai: Arc<FakeTextGenerator>,
    pub gemini: Arc<FakeTextGenerator>,
    pub captioner: Arc<FakeCaptioner>,
    pub stock: Vec<Arc<FakeStockSource>>,
    pub videos: Arc<FakeVideoSource>,
}

impl Default for TestProviders {
    fn default() -> Self {
        Self {
            openai: Arc::new(FakeTextGenerator::ok()),
            gemini: Arc::new(FakeTextGenerator::ok().attributed_to(Upstream::Gemini)),
            captioner: Arc::new(FakeCaptioner::ok()),
            stock: vec![Arc::new(FakeStockSource::returning("unsplash", 1))],
            videos: Arc::new(FakeVideoSource::with_video(sample_video("dQw4w9WgXcQ"))),
        }
    }
}

impl TestProviders {
    pub fn providers(&self) -> Providers {
        Providers {
            openai: self.openai.clone(),
            gemini: self.gemini.clone(),
            captioner: self.captioner.clone(),
            stock: self
                .stock
                .iter()
                .map(|source| source.clone() as Arc<dyn StockPhotoSource>)
                .collect(),
            videos: self.videos.clone(),
            max_comments: 20,
        }
    }
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        auth: AuthConfig {
            jwt_secret: Some(TEST_JWT_SECRET.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub store: MemoryStore,
    pub providers: TestProviders,
    pub config: Config,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(create_test_config(), TestProviders::default())
}

pub fn create_test_app_with(config: Config, providers: TestProviders) -> TestApp {
    create_test_app_over(MemoryStore::new(), config, providers)
}

/// Like [`create_test_app_with`], over a store the caller already holds.
pub fn create_test_app_over(store: MemoryStore, config: Config, providers: TestProviders) -> TestApp {
    let state = AppState::builder()
        .store(Arc::new(store.clone()))
        .config(config.clone())
        .providers(providers.providers())
        .build();
    let router = crate::build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    TestApp {
        server,
        store,
        providers,
        config,
    }
}

/// A free-tier user whose monthly reset already happened this month.
pub fn test_user(free_credits: i32, paid_credits: i32) -> UserDBResponse {
    let now = Utc::now();
    UserDBResponse {
        id: Uuid::new_v4(),
        email: Some("owner@bean.example".to_string()),
        free_credits,
        paid_credits,
        tier: Tier::Free,
        monthly_reset_date: now,
        onboarding_completed: true,
        created_at: now,
        updated_at: now,
    }
}

/// `Authorization` header value carrying a valid access token for `user_id`.
pub fn bearer(user_id: UserId) -> String {
    let claims = AccessTokenClaims {
        sub: user_id,
        email: Some("owner@bean.example".to_string()),
        role: Some("authenticated".to_string()),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        aud: Some("authenticated".to_string()),
    };
    format!("Bearer {}", create_access_token(&claims, TEST_JWT_SECRET))
}
