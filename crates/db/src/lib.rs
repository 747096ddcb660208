//! SQLite pool factory and module migration runner.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use libris_kernel::settings::DatabaseSettings;
use libris_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

const MIGRATIONS_TABLE: &str = "_libris_migrations";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a connection pool for the configured SQLite database.
///
/// The database file is created when missing and opened in WAL mode; a
/// writer waiting on the lock retries for up to [`BUSY_TIMEOUT`]. In-memory
/// databases live only as long as their connection, so they are pinned to a
/// single connection that never expires.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let (options, pool_options) = if is_in_memory(&settings.url) {
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        (options, pool_options)
    } else {
        let pool_options = SqlitePoolOptions::new().max_connections(settings.max_connections);
        (options.journal_mode(SqliteJournalMode::Wal), pool_options)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.url))?;

    tracing::info!(target: "libris-db", url = %settings.url, "database pool ready");
    Ok(pool)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Apply every migration not yet recorded in the migrations ledger.
///
/// Each migration runs in its own transaction together with its ledger row.
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
            module TEXT NOT NULL,
            id TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (module, id)
        )"
    ))
    .execute(pool)
    .await
    .context("failed to create migrations ledger")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let already: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT id FROM {MIGRATIONS_TABLE} WHERE module = ? AND id = ?"
        ))
        .bind(module)
        .bind(migration.id)
        .fetch_optional(pool)
        .await
        .context("failed to read migrations ledger")?;

        if already.is_some() {
            tracing::debug!(target: "libris-db", %module, migration = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;
        sqlx::query(&format!(
            "INSERT INTO {MIGRATIONS_TABLE} (module, id) VALUES (?, ?)"
        ))
        .bind(module)
        .bind(migration.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(target: "libris-db", %module, migration = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> DatabaseSettings {
        DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "shelves".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE shelf (id INTEGER PRIMARY KEY, label TEXT NOT NULL);
                     CREATE INDEX shelf_label ON shelf (label);",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_are_applied_once() {
        let pool = connect(&memory_settings()).await.unwrap();

        assert_eq!(run_migrations(&pool, &migrations()).await.unwrap(), 1);
        assert_eq!(run_migrations(&pool, &migrations()).await.unwrap(), 0);

        sqlx::query("INSERT INTO shelf (label) VALUES ('fiction')")
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failing_migration_is_not_recorded() {
        let pool = connect(&memory_settings()).await.unwrap();
        let broken = vec![(
            "shelves".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE shelf (;",
            },
        )];

        assert!(run_migrations(&pool, &broken).await.is_err());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _libris_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn file_databases_use_wal() {
        let dir = tempfile::tempdir().unwrap();
        let pool = connect(&DatabaseSettings {
            url: format!("sqlite://{}", dir.path().join("libris.db").display()),
            max_connections: 2,
        })
        .await
        .unwrap();

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn memory_urls_are_detected() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:books?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://libris.db"));
    }
}
