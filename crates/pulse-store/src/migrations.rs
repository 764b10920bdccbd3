//! Schema setup for the metrics database.

use rusqlite::Connection;

use crate::errors::Result;

/// Create the metrics schema if it does not exist.
///
/// Metrics are append-only: no UPDATE path exists anywhere in the crate.
/// The `(contact, timestamp)` index serves the range scans behind the
/// history and analysis queries.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS metrics (
             id        INTEGER PRIMARY KEY AUTOINCREMENT,
             contact   TEXT NOT NULL,
             timestamp TEXT NOT NULL,
             rtt       INTEGER NOT NULL CHECK (rtt >= 0),
             state     TEXT NOT NULL CHECK (state IN ('Online', 'Standby', 'Offline'))
         );
         CREATE INDEX IF NOT EXISTS idx_metrics_contact_timestamp
             ON metrics (contact, timestamp);",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, new_in_memory};

    #[test]
    fn migrations_are_idempotent() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
    }

    #[test]
    fn state_check_rejects_unknown_states() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO metrics (contact, timestamp, rtt, state)
             VALUES ('c', '2026-01-01T00:00:00.000Z', 10, 'Calibrating')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn rtt_check_rejects_negative() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO metrics (contact, timestamp, rtt, state)
             VALUES ('c', '2026-01-01T00:00:00.000Z', -1, 'Online')",
            [],
        );
        assert!(result.is_err());
    }
}
