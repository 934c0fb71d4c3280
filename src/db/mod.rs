pub mod agents;
pub mod hand_history;
pub mod models;
pub mod pairs;
pub mod records;
pub mod snapshots;

use sqlx::{sqlite::SqlitePool, Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    // Create the database file if it doesn't exist
    if let Some(db_path) = database_url.strip_prefix("sqlite:") {
        if db_path != ":memory:" && !Path::new(db_path).exists() {
            if let Some(parent) = Path::new(db_path).parent() {
                std::fs::create_dir_all(parent).ok();
            }
            std::fs::File::create(db_path).ok();
        }
    }

    SqlitePool::connect(database_url).await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version BIGINT PRIMARY KEY,
            description TEXT NOT NULL,
            installed_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // List of migrations: (version, name, sql)
    let migrations: Vec<(i64, &str, &str)> = vec![(
        1,
        "initial_schema",
        include_str!("migrations/001_initial_schema.sql"),
    )];

    for (version, name, sql) in migrations {
        let already_run = sqlx::query("SELECT 1 FROM _migrations WHERE version = ?")
            .bind(version)
            .fetch_optional(pool)
            .await?
            .is_some();
        if already_run {
            tracing::debug!("Migration {} ({}) already applied", version, name);
            continue;
        }

        tracing::info!("Running migration {} ({})", version, name);
        execute_migration_sql(pool, sql).await?;
        sqlx::query("INSERT INTO _migrations (version, description) VALUES (?, ?)")
            .bind(version)
            .bind(name)
            .execute(pool)
            .await?;
    }

    tracing::info!("All migrations completed");
    Ok(())
}

async fn execute_migration_sql(pool: &DbPool, sql: &str) -> Result<(), sqlx::Error> {
    // Split by semicolon and execute each non-comment statement.
    for statement in sql.split(';') {
        let clean: Vec<&str> = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--") && !line.trim().is_empty())
            .collect();
        if clean.is_empty() {
            continue;
        }
        sqlx::query(&clean.join("\n")).execute(pool).await?;
    }
    Ok(())
}
