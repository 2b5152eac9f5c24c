use super::schema::{self, SCHEMA_VERSION};
use crate::error::{Error, Result};
use crate::trace::Event;
use rusqlite::Connection;
use std::path::Path;

/// Pending events written per transaction
const FLUSH_BATCH: usize = 10_000;

/// Builds a trace database from a time-ordered event stream
pub struct TraceWriter {
    conn: Connection,
    /// Pending events with their descriptions
    pending: Vec<(Event, String)>,
    written: u64,
    last_time: u64,
}

impl TraceWriter {
    /// Create a new trace file, replacing any trace tables already in it
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Rollback journal, so readers can open the finished file read-only
        conn.execute_batch(
            "PRAGMA journal_mode = DELETE;
             PRAGMA synchronous = NORMAL;",
        )?;

        // Create tables (drops existing tables first)
        schema::create_tables(&conn)?;

        schema::set_meta(&conn, "version", &SCHEMA_VERSION.to_string())?;
        schema::set_meta(&conn, "created", &chrono::Utc::now().to_rfc3339())?;

        Ok(TraceWriter {
            conn,
            pending: Vec::new(),
            written: 0,
            last_time: 0,
        })
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        schema::set_meta(&self.conn, key, value)?;
        Ok(())
    }

    /// Queue one event. Events must come in non-decreasing time order and
    /// times must fit SQLite's signed integers so that `ORDER BY time` holds.
    pub fn append(&mut self, event: Event, description: &str) -> Result<()> {
        if event.time > i64::MAX as u64 {
            return Err(Error::InvalidTrace(format!(
                "event {} has time {} beyond the storable range",
                event.id, event.time
            )));
        }
        if event.time < self.last_time {
            return Err(Error::InvalidTrace(format!(
                "event {} at time {} is earlier than the previous event at time {}",
                event.id, event.time, self.last_time
            )));
        }
        self.last_time = event.time;
        self.pending.push((event, description.to_string()));
        if self.pending.len() >= FLUSH_BATCH {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events (id, time, address, size, kind, value, description) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )?;

            for (event, description) in self.pending.drain(..) {
                stmt.execute(rusqlite::params![
                    event.id,
                    event.time as i64,
                    event.address as i64,
                    event.size,
                    event.kind.bits(),
                    event.value as i64,
                    description,
                ])?;
                self.written += 1;
            }
        }
        tx.commit()?;
        tracing::debug!(written = self.written, "flushed events");
        Ok(())
    }

    /// Write everything still pending and return the number of events stored
    pub fn commit(mut self) -> Result<u64> {
        self.flush()?;
        schema::set_meta(&self.conn, "event_count", &self.written.to_string())?;
        Ok(self.written)
    }
}
