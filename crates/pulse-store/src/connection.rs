//! SQLite connection pooling.

use std::path::Path;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;

use crate::errors::Result;

/// Pool of SQLite connections.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;
/// One checked-out connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Pool construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size.
    pub max_size: u32,
    /// SQLite busy timeout per connection.
    pub busy_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_size: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

fn init_connection(
    conn: &mut rusqlite::Connection,
    busy_timeout: Duration,
) -> std::result::Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )
}

/// Open a pool over a database file.
pub fn new_pool(path: &Path, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let busy_timeout = config.busy_timeout;
    let manager = SqliteConnectionManager::file(path)
        .with_init(move |conn| init_connection(conn, busy_timeout));
    Ok(r2d2::Pool::builder()
        .max_size(config.max_size)
        .build(manager)?)
}

/// Open an in-memory pool (tests and `:memory:` configurations).
///
/// Pool size is pinned to 1 — separate in-memory connections would each
/// see their own empty database.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    let busy_timeout = config.busy_timeout;
    let manager = SqliteConnectionManager::memory()
        .with_init(move |conn| init_connection(conn, busy_timeout));
    Ok(r2d2::Pool::builder().max_size(1).build(manager)?)
}
