//! # copydeck: marketing content generation service
//!
//! `copydeck` turns a short brand brief (brand name, keywords, tone, audience, industry) plus a
//! handful of images into ready-to-post copy for Instagram, Threads, a blog and YouTube, and
//! analyzes existing YouTube videos for summary, SEO, engagement and comment insights.
//!
//! ## Architecture
//!
//! The service is an [Axum](https://github.com/tokio-rs/axum) application over a [`db::store::Store`]
//! that is either PostgreSQL (the Supabase database in production) or process memory for local
//! development and tests.
//!
//! ### Request Flow
//!
//! `POST /api/generate` is open to guests: a guest gets a one-time trial per client IP, recorded in
//! `trial_usage`. Signed-in users pay [`config::CreditsConfig::credits_per_platform`] for every
//! platform that came back successfully, spending monthly free credits before purchased ones.
//!
//! Every other route requires a Supabase access token, verified by the
//! [`auth::current_user::CurrentUser`] extractor. Video analysis goes through a shared cache keyed
//! by (video, analysis type); a cache hit is free and never touches YouTube or the model.
//!
//! ### Core Components
//!
//! - [`api`]: Route handlers and request/response bodies
//! - [`auth`]: Access token verification and client IP extraction
//! - [`credits`]: Monthly resets, affordability checks and charging
//! - [`generation`]: Prompt building and per-platform generation
//! - [`images`]: Caption uploaded images and top them up with stock photos
//! - [`youtube`]: Video URL parsing, analysis and its cache
//! - [`providers`]: Clients for OpenAI, Gemini, YouTube and the stock photo APIs
//! - [`db`]: Storage traits with PostgreSQL and in-memory backends
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use copydeck::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = copydeck::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     copydeck::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod credits;
pub mod db;
pub mod errors;
pub mod generation;
pub mod images;
mod openapi;
pub mod providers;
pub mod telemetry;
pub mod types;
pub mod youtube;

#[cfg(test)]
pub mod test_utils;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    http::{self, HeaderValue, Method},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    config::{CorsOrigin, DatabaseConfig},
    db::{handlers::PostgresStore, memory::MemoryStore, store::Store},
    openapi::ApiDoc,
    providers::Providers,
};

pub use types::UserId;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(Arc::new(MemoryStore::new()))
///     .config(config)
///     .providers(providers)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub providers: Providers,
}

/// Get the copydeck database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;
    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{generate, history, profiles, users, youtube};

    let api_routes = Router::new()
        .route("/generate", post(generate::generate))
        .route("/youtube/analyze", post(youtube::analyze_video))
        .route("/youtube/history", get(youtube::list_analyses))
        .route("/youtube/history/{id}", get(youtube::get_analysis).delete(youtube::delete_analysis))
        .route("/youtube/stats", get(youtube::analysis_stats))
        .route("/user/credits", get(users::get_credits))
        .route("/user/onboarding", post(users::complete_onboarding))
        .route("/history", get(history::list_content))
        .route("/history/{id}", get(history::get_content).delete(history::delete_content))
        .route("/profiles", get(profiles::list_profiles).post(profiles::create_profile))
        .route(
            "/profiles/{id}",
            get(profiles::get_profile).put(profiles::update_profile).delete(profiles::delete_profile),
        )
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        );

    Ok(router)
}

/// Create the store selected by `config.database`, returning the pool when PostgreSQL is used.
async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::Memory => {
            info!("Using in-memory store; data will not survive a restart");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        DatabaseConfig::External {
            url,
            max_connections,
            run_migrations,
        } => {
            let pool = PgPoolOptions::new().max_connections(*max_connections).connect(url).await?;
            if *run_migrations {
                info!("Running database migrations");
                migrator().run(&pool).await?;
            }
            Ok((Arc::new(PostgresStore::new(pool.clone())), Some(pool)))
        }
    }
}

/// The assembled service.
///
/// 1. **Create**: [`Application::new`] connects the store, runs migrations and builds the
///    provider clients
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests finish and the pool closes
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting copydeck with configuration: {:#?}", config);

        let (store, pool) = setup_store(&config).await?;
        let providers = Providers::from_config(&config.providers)?;

        let state = AppState::builder()
            .store(store)
            .config(config.clone())
            .providers(providers)
            .build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("copydeck listening on http://{}", bind_addr);

        // Connect info feeds the client IP fallback for guest trials
        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}
