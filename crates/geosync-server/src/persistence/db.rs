//! Database connection and initialization.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

const SCHEMA: &str = include_str!("../../migrations/001_init.sql");

/// Database connection wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Open (or create) the SQLite file at `db_path` and apply the schema.
///
/// `:memory:` gives a private database per connection, so callers using it
/// should pass `max_connections = 1`.
pub async fn init_database(db_path: &str, max_connections: u32) -> Result<Database> {
    let parent = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating database directory {}", dir.display()))?;
    }

    info!("Opening location database at {}", db_path);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    apply_schema(&pool).await?;
    Ok(Database { pool })
}

/// The schema is idempotent, so this runs on every start.
async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("applying location schema")?;
    Ok(())
}
