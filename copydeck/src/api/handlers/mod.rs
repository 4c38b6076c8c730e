//! HTTP request handlers.
//!
//! - [`generate`]: Platform copy generation for guests and users
//! - [`youtube`]: Video analysis, analysis history and stats
//! - [`users`]: Credit balances and onboarding
//! - [`history`]: Past generations
//! - [`profiles`]: Brand presets
//!
//! # Authentication
//!
//! All routes except `generate` take a [`crate::auth::current_user::CurrentUser`], which rejects
//! requests without a valid Supabase access token.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which renders as
//! `{success: false, error, code, message?, redirect?}` with the matching status code.

pub mod generate;
pub mod history;
pub mod profiles;
pub mod users;
pub mod youtube;
