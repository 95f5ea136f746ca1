use rusqlite::Connection;
use std::sync::{Mutex, OnceLock};

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

static MIGRATION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Applies every pending migration from `migrations/`.
///
/// Runs are serialized per process; refinery wraps each migration in its own
/// transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<(), refinery::Error> {
    let mutex = MIGRATION_LOCK.get_or_init(|| Mutex::new(()));
    let _guard = match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Migration lock was poisoned, recovering...");
            poisoned.into_inner()
        }
    };

    let report = embedded::migrations::runner().run(conn)?;

    for migration in report.applied_migrations() {
        log::info!("Applied migration {}", migration);
    }
    Ok(())
}
