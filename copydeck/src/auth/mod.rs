//! Request identity.
//!
//! Signed-in users authenticate with the Supabase access token issued to the browser, sent as
//! `Authorization: Bearer <jwt>`. Tokens are HS256-signed with the project's JWT secret and carry
//! the user id in `sub`.
//!
//! Guests are identified only by their client IP, which gates the anonymous trial.
//!
//! # Modules
//!
//! - [`session`]: Access token verification
//! - [`current_user`]: Extractor yielding the authenticated [`current_user::CurrentUser`]
//! - [`client_ip`]: Extractor yielding the caller's IP address
//!
//! # Usage in Handlers
//!
//! ```ignore
//! async fn credits(user: CurrentUser, State(state): State<AppState>) -> Result<Json<CreditsResponse>> {
//!     let row = credits::load_user(&*state.store, &state.config.credits, user.id, Utc::now()).await?;
//!     ...
//! }
//! ```

pub mod client_ip;
pub mod current_user;
pub mod session;
