//! `PostgreSQL` storage for Canteen.
//!
//! Implements the persistent provider traits:
//!
//! - [`PostgresPassRepository`]: `canteen_auth::PassRepository`
//! - [`PostgresOrderStore`]: `canteen_orders::Catalog` and `canteen_orders::OrderStore`
//!
//! Queries are built at runtime with `sqlx::query`, so the crate compiles
//! without a database. Schema lives in `migrations/`.
//!
//! # Example
//!
//! ```ignore
//! use canteen_postgres::{connect, migrate, PostgresOrderStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = connect("postgres://localhost/canteen", 10).await?;
//!     migrate(&pool).await?;
//!     let orders = PostgresOrderStore::new(pool);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod orders;
pub mod passes;

pub use orders::PostgresOrderStore;
pub use passes::PostgresPassRepository;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Open a connection pool.
///
/// # Errors
///
/// Returns the driver error if the database cannot be reached.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns the migration error if any migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
