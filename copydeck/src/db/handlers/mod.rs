//! PostgreSQL implementation of the storage traits.
//!
//! One file per table, each adding `impl <Table>Store for PostgresStore`. Queries are checked at
//! runtime (`sqlx::query_as::<_, T>`) and every multi-step rule that needs atomicity is a single
//! statement:
//!
//! - credit deduction is a conditional `UPDATE ... RETURNING` that matches no row when the
//!   balance is short
//! - trial counting and cache writes are `INSERT ... ON CONFLICT DO UPDATE`
//!
//! ```ignore
//! let pool = PgPoolOptions::new().connect(&url).await?;
//! copydeck::migrator().run(&pool).await?;
//! let store = PostgresStore::new(pool);
//! let user = store.get_user(user_id).await?;
//! ```

pub mod content_history;
pub mod profiles;
pub mod trial_usage;
pub mod users;
pub mod youtube;

use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
