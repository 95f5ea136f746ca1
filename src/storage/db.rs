use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;

use crate::core::error::AppResult;
use crate::storage::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Connection pool limits. Every wait on the store is bounded by one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Maximum number of pooled connections
    pub pool_size: u32,
    /// How long a request may wait for a free connection
    pub connection_timeout: Duration,
    /// How long SQLite waits on a locked database before returning BUSY
    pub busy_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// Create a new database connection pool
///
/// Each connection gets the configured busy timeout, enforced foreign keys
/// and WAL journaling. Schema migrations run on the first connection; any
/// failure here is fatal for startup.
///
/// # Example
///
/// ```no_run
/// use unidesk::storage::db::{self, StoreSettings};
///
/// let pool = db::create_pool("unidesk.sqlite", &StoreSettings::default())?;
/// # Ok::<(), unidesk::core::AppError>(())
/// ```
pub fn create_pool(database_path: &str, settings: &StoreSettings) -> AppResult<DbPool> {
    let busy_timeout = settings.busy_timeout;
    let manager = SqliteConnectionManager::file(database_path).with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(settings.pool_size)
        .connection_timeout(settings.connection_timeout)
        .build(manager)?;

    let mut conn = pool.get()?;
    migrations::run_migrations(&mut conn)?;

    log::info!(
        "Database pool ready: {} ({} connections max)",
        database_path,
        settings.pool_size
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_pool_applies_schema_and_pragmas() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.sqlite");
        let pool = create_pool(path.to_str().unwrap(), &StoreSettings::default()).unwrap();

        let conn = pool.get().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'tickets', 'ticket_messages')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);

        let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_create_pool_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.sqlite");
        let path = path.to_str().unwrap();
        drop(create_pool(path, &StoreSettings::default()).unwrap());
        assert!(create_pool(path, &StoreSettings::default()).is_ok());
    }

    #[test]
    fn test_unreachable_store_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("desk.sqlite");
        let settings = StoreSettings {
            connection_timeout: Duration::from_millis(200),
            ..StoreSettings::default()
        };
        assert!(create_pool(path.to_str().unwrap(), &settings).is_err());
    }
}
