//! Metric repository — append and range scans over the `metrics` table.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use pulse_core::types::{ActivityState, ContactAddress, Metric};

use crate::errors::{Result, StoreError};

/// Encode a timestamp as fixed-width RFC 3339 (`.mmmZ`).
///
/// Fixed width keeps lexicographic TEXT comparison equal to chronological
/// order, which the range scans rely on.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_row(
    contact: String,
    timestamp: String,
    rtt: i64,
    state: String,
) -> Result<Metric> {
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| StoreError::InvalidRow(format!("bad timestamp '{timestamp}': {e}")))?
        .with_timezone(&Utc);
    let state = ActivityState::from_sql(&state)
        .ok_or_else(|| StoreError::InvalidRow(format!("unknown state '{state}'")))?;
    Ok(Metric {
        contact: ContactAddress::new(contact),
        timestamp,
        rtt: rtt.max(0) as u64,
        state,
    })
}

/// Metric repository — stateless, every method takes `&Connection`.
pub struct MetricRepo;

impl MetricRepo {
    /// Append one metric.
    pub fn insert(conn: &Connection, metric: &Metric) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO metrics (contact, timestamp, rtt, state) VALUES (?1, ?2, ?3, ?4)",
            params![
                metric.contact.as_str(),
                encode_timestamp(metric.timestamp),
                metric.rtt as i64,
                metric.state.as_sql(),
            ],
        )?;
        Ok(())
    }

    /// All metrics for a contact in `[from, to)`, timestamp ascending.
    pub fn range(
        conn: &Connection,
        contact: &ContactAddress,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Metric>> {
        let mut stmt = conn.prepare(
            "SELECT contact, timestamp, rtt, state FROM metrics
             WHERE contact = ?1 AND timestamp >= ?2 AND timestamp < ?3
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt
            .query_map(
                params![
                    contact.as_str(),
                    encode_timestamp(from),
                    encode_timestamp(to)
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(contact, timestamp, rtt, state)| decode_row(contact, timestamp, rtt, state))
            .collect()
    }

    /// Most recent metric for a contact, if any.
    pub fn latest(conn: &Connection, contact: &ContactAddress) -> Result<Option<Metric>> {
        let row = conn
            .query_row(
                "SELECT contact, timestamp, rtt, state FROM metrics
                 WHERE contact = ?1 ORDER BY timestamp DESC LIMIT 1",
                params![contact.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(contact, timestamp, rtt, state)| decode_row(contact, timestamp, rtt, state))
            .transpose()
    }

    /// Count of metrics stored for a contact.
    pub fn count(conn: &Connection, contact: &ContactAddress) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM metrics WHERE contact = ?1",
            params![contact.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
