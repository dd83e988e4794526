use diesel::connection::SimpleConnection;
use diesel::{Connection, SqliteConnection};
use diesel_async::SimpleAsyncConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task;
use tracing::Instrument;
use tracing::{info, instrument, warn};

/// SQLite is a single-writer engine, so the whole service shares one
/// connection. Blocking calls are moved onto the blocking pool by the wrapper.
pub type DbConnection = SyncConnectionWrapper<SqliteConnection>;

pub const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<DbConnection>>,
}

impl Database {
    pub fn new(conn: SqliteConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(SyncConnectionWrapper::new(conn))),
        }
    }

    /// Waits for exclusive use of the shared connection.
    pub async fn acquire(&self) -> MutexGuard<'_, DbConnection> {
        self.conn
            .lock()
            .instrument(tracing::info_span!("acquiring_db_connection"))
            .await
    }
}

/// Opens (creating if absent) the database at `database_url`, applies the
/// connection pragmas and runs every pending migration before handing the
/// connection over to the async side.
///
/// `:memory:` is accepted and gives a private database for the lifetime of
/// the returned handle.
pub async fn establish_connection(
    database_url: String,
    migrations: EmbeddedMigrations,
) -> Result<Database, anyhow::Error> {
    let conn = task::spawn_blocking(move || {
        let mut conn = SqliteConnection::establish(&database_url)?;
        conn.batch_execute(&format!(
            "PRAGMA journal_mode = WAL; PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))?;

        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
        info!("Applied {} pending migration(s)", applied.len());

        Ok::<_, anyhow::Error>(conn)
    })
    .await??;

    Ok(Database::new(conn))
}

/// Round-trips a trivial statement through the shared connection.
pub async fn ping(db: &Database) -> Result<(), diesel::result::Error> {
    let mut conn = db.acquire().await;
    conn.batch_execute("SELECT 1").await
}

/// Execute a database operation with the shared connection.
///
/// The connection is locked only for the duration of `operation`, so a
/// handler never holds it while doing unrelated work.
///
/// # Example
///
/// ```rust,ignore
/// use sqlite_models::connection::with_connection;
///
/// let reading = with_connection(&state.db, |conn| {
///     Box::pin(Reading::create(NewReading { weight }, conn))
/// })
/// .await?;
/// ```
///
/// # Tracing
///
/// - `acquiring_db_connection` span: time spent waiting for the connection
/// - `holding_db_connection` span: time the connection is held and used
pub async fn with_connection<F, T, E>(
    db: &Database,
    operation: F,
) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c mut DbConnection) -> BoxFuture<'c, Result<T, E>>,
{
    let mut conn = db.acquire().await;

    let hold_span = tracing::info_span!("holding_db_connection");
    let result = operation(&mut *conn).instrument(hold_span).await;

    tracing::debug!("db_connection_released");

    result
}

/// Waits for any in-flight statement to finish, then folds the WAL back into
/// the main database file.
#[instrument(skip(db))]
pub async fn shutdown_with_timeout(
    db: Database,
    shutdown_timeout: Duration,
) -> Result<(), String> {
    info!("Starting graceful SQLite shutdown with timeout");

    let mut conn = match tokio::time::timeout(shutdown_timeout, db.acquire())
        .await
    {
        Ok(conn) => conn,
        Err(_) => {
            warn!("Shutdown timeout reached with a statement still running");
            return Err("timed out waiting for the database connection".into());
        }
    };

    if let Err(e) = conn.batch_execute("PRAGMA wal_checkpoint(TRUNCATE)").await
    {
        warn!("WAL checkpoint failed: {}", e);
        return Err(e.to_string());
    }

    info!("SQLite shutdown complete");
    Ok(())
}
