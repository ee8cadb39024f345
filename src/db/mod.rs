//! Database module for SQLite persistence.
//!
//! SQLite holds the local property records that augment the upstream catalog.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS local_properties (
            owner_rez_id INTEGER PRIMARY KEY,
            description TEXT,
            amenities TEXT NOT NULL DEFAULT '[]',
            house_rules TEXT NOT NULL DEFAULT '[]',
            pricing TEXT,
            availability TEXT,
            cancellation_policy TEXT,
            pet_policy TEXT,
            smoking_policy TEXT,
            owner TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            verified INTEGER NOT NULL DEFAULT 0,
            images TEXT NOT NULL DEFAULT '[]',
            last_synced_with_owner_rez TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_local_properties_status ON local_properties(status);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
