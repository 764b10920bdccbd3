//! Store errors.

use thiserror::Error;

/// Convenience result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the metric store.
///
/// A failed append on the probe path is logged and the tick proceeds —
/// operators watching live state matter more than one missing historical
/// point.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool exhausted or unavailable.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A persisted row does not decode to a valid metric.
    #[error("invalid stored metric: {0}")]
    InvalidRow(String),
}
