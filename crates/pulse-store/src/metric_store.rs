//! High-level `MetricStore` API over the connection pool.

use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::instrument;

use pulse_core::types::{ContactAddress, Metric};

use crate::connection::{ConnectionPool, PooledConnection};
use crate::errors::{Result, StoreError};
use crate::repository::MetricRepo;

/// Durable sink and source for metric records.
///
/// Appends are independent per contact and may run in parallel; ordering
/// is only required within a single contact's stream, which holds because
/// each probe loop is serialized.
pub struct MetricStore {
    pool: ConnectionPool,
}

impl MetricStore {
    const BUSY_MAX_RETRIES: u32 = 16;

    /// Create a store over the given pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Retry an operation on SQLite BUSY/LOCKED with linear backoff + jitter.
    fn retry_on_busy<T>(mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempts = 0;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err) if Self::is_busy_or_locked(&err) && attempts < Self::BUSY_MAX_RETRIES => {
                    attempts += 1;
                    let base_ms = u64::from(attempts).saturating_mul(10).min(250);
                    let jitter_range = base_ms / 4;
                    let jitter = if jitter_range > 0 {
                        rand::random::<u64>() % (jitter_range * 2 + 1)
                    } else {
                        0
                    };
                    let backoff_ms = base_ms.saturating_sub(jitter_range) + jitter;
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn is_busy_or_locked(err: &StoreError) -> bool {
        match err {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(code, _)) => matches!(
                code.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Append one metric to a contact's stream.
    #[instrument(skip(self, metric), fields(contact = %metric.contact, state = %metric.state))]
    pub fn append(&self, metric: &Metric) -> Result<()> {
        Self::retry_on_busy(|| {
            let conn = self.conn()?;
            MetricRepo::insert(&conn, metric)
        })?;
        counter!("metrics_appended_total").increment(1);
        Ok(())
    }

    /// Metrics for a contact within `[from, to)`, timestamp ascending.
    #[instrument(skip(self), fields(contact = %contact))]
    pub fn range(
        &self,
        contact: &ContactAddress,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Metric>> {
        let conn = self.conn()?;
        MetricRepo::range(&conn, contact, from, to)
    }

    /// Metrics for a contact over the trailing `window` ending now.
    pub fn trailing(&self, contact: &ContactAddress, window: Duration) -> Result<Vec<Metric>> {
        let to = Utc::now();
        let from = to
            - chrono::Duration::from_std(window)
                .unwrap_or_else(|_| chrono::Duration::hours(24));
        // Upper bound is exclusive; nudge past "now" so a metric written
        // this very millisecond is included.
        self.range(contact, from, to + chrono::Duration::milliseconds(1))
    }

    /// Most recent metric for a contact, if any.
    pub fn latest(&self, contact: &ContactAddress) -> Result<Option<Metric>> {
        let conn = self.conn()?;
        MetricRepo::latest(&conn, contact)
    }

    /// Count of metrics stored for a contact.
    pub fn count(&self, contact: &ContactAddress) -> Result<i64> {
        let conn = self.conn()?;
        MetricRepo::count(&conn, contact)
    }
}
