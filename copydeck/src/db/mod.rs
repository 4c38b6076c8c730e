//! Data persistence.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers, hold an Arc<dyn Store>)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Store     │  (db::store - one trait per table)
//! └──────┬──────┘
//!        │
//!   ┌────┴─────────────┐
//!   ↓                  ↓
//! PostgresStore     MemoryStore
//! (db::handlers)    (db::memory)
//! ```
//!
//! # Modules
//!
//! - [`store`]: Storage traits shared by both backends
//! - [`handlers`]: PostgreSQL implementation
//! - [`memory`]: Process-local implementation for tests and local development
//! - [`models`]: Row structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are embedded at compile time. [`crate::migrator`] runs
//! them at startup when `database.run_migrations` is set:
//!
//! ```ignore
//! copydeck::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod store;
