//! Storage for the tournament engine.
//!
//! Managers only see [`TournamentStore`]. [`MemoryStore`] keeps everything in
//! process; [`PgTournamentStore`] persists to PostgreSQL through a pool owned
//! by [`Database`], which also applies the bundled migrations.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod memory;
pub mod postgres;
pub mod store;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use postgres::PgTournamentStore;
pub use store::{RegistrationInsert, RoundInsert, TournamentStore};

/// Pool settings derived from `config`
fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
}

/// PostgreSQL pool shared by the tournament store and the collaborators
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect using `config`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use club_tourney::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let db = Database::new(&DatabaseConfig::development()).await?;
    ///     db.run_migrations().await?;
    ///     let store = db.tournament_store();
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = pool_options(config).connect(&config.database_url).await?;
        log::info!(
            "Database pool ready ({}..{} connections)",
            config.min_connections,
            config.max_connections
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create or upgrade the event, registration, round and match tables
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Tournament store on this pool
    pub fn tournament_store(&self) -> PgTournamentStore {
        PgTournamentStore::new(self.pool.clone())
    }

    /// Drain and close every connection
    pub async fn close(self) {
        self.pool.close().await;
    }
}
