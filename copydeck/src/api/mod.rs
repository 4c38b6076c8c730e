//! HTTP surface of the service.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response bodies
//!
//! # Routes
//!
//! - `POST /api/generate`: Platform copy for a brand (guests or users)
//! - `/api/youtube/*`: Cached video analysis and its history
//! - `/api/user/*`: Credit balance and onboarding
//! - `/api/history/*`: Past generations
//! - `/api/profiles/*`: Saved brand presets
//!
//! Everything except `/api/generate` requires a Supabase access token. The OpenAPI document is
//! served at `/openapi.json` with a browsable UI at `/docs`.

pub mod handlers;
pub mod models;
