use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use sea_orm::{ConnectionTrait, DatabaseConnection, SqlxPostgresConnector, Statement};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::fs;

use crate::config::AppConfig;

pub type DbPool = PgPool;
pub type OrmConn = DatabaseConnection;

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Build the shared Postgres pool, retrying the first connect with exponential backoff.
///
/// Connections are health-checked before being handed out again.
pub async fn create_pool(config: &AppConfig) -> Result<DbPool> {
    connect_with_retry(
        &config.database_url,
        config.db_max_connections,
        config.db_connect_retries,
    )
    .await
}

pub async fn connect_with_retry(
    database_url: &str,
    max_connections: u32,
    retries: u32,
) -> Result<DbPool> {
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 0;
    loop {
        let result = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .test_before_acquire(true)
            .connect(database_url)
            .await;

        match result {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < retries => {
                attempt += 1;
                tracing::warn!(
                    error = %err,
                    attempt,
                    retry_in_ms = backoff.as_millis() as u64,
                    "database connect failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Wrap an existing pool in a SeaORM connection; both share the same connections.
pub fn orm_from_pool(pool: &DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone())
}

pub async fn ping(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Minimal migration runner that executes SQL files in `migrations/` in filename order.
///
/// Statements are written to be idempotent, so the runner can be applied on every boot.
pub async fn run_migrations(conn: &OrmConn) -> Result<()> {
    let mut entries = fs::read_dir("migrations").await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in files {
        let sql = fs::read_to_string(&file).await?;
        // Postgres prepared statements cannot contain multiple commands,
        // so split the migration file and run each statement individually.
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            conn.execute(Statement::from_string(backend, format!("{stmt};")))
                .await?;
        }
        tracing::debug!(file = %file.display(), "migration applied");
    }

    Ok(())
}
