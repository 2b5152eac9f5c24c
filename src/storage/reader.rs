use super::schema::{self, OptionalExt};
use crate::error::{Error, Result};
use crate::trace::{Event, EventType, TraceIndex};
use rusqlite::{Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Event counts of a stored trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceStats {
    pub events: u64,
    pub reads: u64,
    pub writes: u64,
    pub read_writes: u64,
    pub instructions: u64,
    pub first_time: Option<u64>,
    pub last_time: Option<u64>,
}

/// Read-only access to a trace database
pub struct TraceReader {
    conn: Connection,
    path: PathBuf,
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        time: row.get::<_, i64>(1)? as u64,
        address: row.get::<_, i64>(2)? as u64,
        size: row.get(3)?,
        kind: EventType::from_bits(row.get(4)?),
        value: row.get::<_, i64>(5)? as u64,
    })
}

impl TraceReader {
    /// Open an existing trace, rejecting databases without an events table
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        if !schema::has_events_table(&conn)? {
            return Err(Error::InvalidTrace(format!(
                "{} has no events table",
                path.display()
            )));
        }
        Ok(TraceReader {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All metadata key/value pairs
    pub fn metadata(&self) -> Result<Vec<(String, String)>> {
        Ok(schema::all_meta(&self.conn)?)
    }

    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        Ok(schema::get_meta(&self.conn, key)?)
    }

    pub fn stats(&self) -> Result<TraceStats> {
        let mut stats = TraceStats::default();

        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM events GROUP BY kind")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, u8>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (kind, count) = row?;
            let count = count as u64;
            stats.events += count;
            match EventType::from_bits(kind) {
                EventType::READ => stats.reads += count,
                EventType::WRITE => stats.writes += count,
                EventType::INS => stats.instructions += count,
                k if k == EventType::READ | EventType::WRITE => stats.read_writes += count,
                _ => {}
            }
        }

        let (first, last): (Option<i64>, Option<i64>) =
            self.conn
                .query_row("SELECT MIN(time), MAX(time) FROM events", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
        stats.first_time = first.map(|t| t as u64);
        stats.last_time = last.map(|t| t as u64);

        Ok(stats)
    }

    /// Reset `index`, stream every event into it in time order and finish it.
    ///
    /// Returns the number of events loaded.
    pub fn load_into(&self, index: &mut TraceIndex) -> Result<u64> {
        let start = Instant::now();
        index.reset();

        let mut stmt = self.conn.prepare(
            "SELECT id, time, address, size, kind, value FROM events ORDER BY time, id",
        )?;
        let rows = stmt.query_map([], event_from_row)?;

        let mut count = 0u64;
        for row in rows {
            index.ingest(row?);
            count += 1;
        }
        index.finish();

        tracing::info!(
            path = %self.path.display(),
            events = count,
            blocks = index.blocks().len(),
            regions = index.regions().len(),
            elapsed = %humantime::format_duration(start.elapsed()),
            "trace loaded"
        );
        Ok(count)
    }

    /// Human readable description of an event, preferring the stored one
    pub fn describe_event(&self, event: &Event) -> Result<String> {
        if event.is_ufo() {
            return Ok("No event".to_string());
        }

        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT description FROM events WHERE id = ?",
                [event.id],
                |row| row.get(0),
            )
            .optional()?;

        let summary = format!(
            "#{} {} {} bytes at 0x{:x} time {}",
            event.id, event.kind, event.size, event.address, event.time
        );
        Ok(match stored {
            Some(desc) if !desc.is_empty() => format!("{summary}: {desc}"),
            _ if event.kind == EventType::INS => summary,
            _ => format!("{summary} value 0x{:x}", event.value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TraceWriter;
    use tempfile::tempdir;

    fn event(id: i64, time: u64, address: u64, size: u32, kind: EventType, value: u64) -> Event {
        Event {
            time,
            address,
            size,
            id,
            kind,
            value,
        }
    }

    fn write_trace(path: &Path) {
        let mut writer = TraceWriter::create(path).unwrap();
        writer.set_meta("program", "demo").unwrap();
        writer
            .append(event(1, 0, 0x40_1000, 4, EventType::INS, 0), "mov eax, [rbx]")
            .unwrap();
        writer
            .append(event(2, 0, 0x7fff_ffff_e010, 8, EventType::READ, u64::MAX), "")
            .unwrap();
        writer
            .append(event(3, 1, 0x40_1004, 2, EventType::INS, 0), "")
            .unwrap();
        writer
            .append(event(4, 1, 0x60_0000, 4, EventType::WRITE, 0xcafe), "")
            .unwrap();
        writer
            .append(
                event(5, 2, 0x60_0008, 4, EventType::READ | EventType::WRITE, 1),
                "",
            )
            .unwrap();
        assert_eq!(writer.commit().unwrap(), 5);
    }

    #[test]
    fn test_load_into_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.db");
        write_trace(&path);

        let reader = TraceReader::open(&path).unwrap();
        let mut index = TraceIndex::new();
        assert_eq!(reader.load_into(&mut index).unwrap(), 5);

        assert!(index.is_ready());
        assert_eq!(index.blocks().len(), 3);
        assert_eq!(index.total_time(), 2);
        assert_eq!(index.total_bytes(), 0x3000);
        let high = &index.blocks()[2];
        assert_eq!(high.address, 0x7fff_ffff_e000);
        assert_eq!(high.events[0].value, u64::MAX);
    }

    #[test]
    fn test_metadata_and_stats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.db");
        write_trace(&path);

        let reader = TraceReader::open(&path).unwrap();
        assert_eq!(reader.meta("program").unwrap().as_deref(), Some("demo"));
        assert_eq!(reader.meta("event_count").unwrap().as_deref(), Some("5"));
        assert!(reader.metadata().unwrap().iter().any(|(k, _)| k == "created"));

        let stats = reader.stats().unwrap();
        assert_eq!(
            stats,
            TraceStats {
                events: 5,
                reads: 1,
                writes: 1,
                read_writes: 1,
                instructions: 2,
                first_time: Some(0),
                last_time: Some(2),
            }
        );
    }

    #[test]
    fn test_describe_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.db");
        write_trace(&path);
        let reader = TraceReader::open(&path).unwrap();

        let ins = event(1, 0, 0x40_1000, 4, EventType::INS, 0);
        assert_eq!(
            reader.describe_event(&ins).unwrap(),
            "#1 I 4 bytes at 0x401000 time 0: mov eax, [rbx]"
        );
        let write = event(4, 1, 0x60_0000, 4, EventType::WRITE, 0xcafe);
        assert_eq!(
            reader.describe_event(&write).unwrap(),
            "#4 W 4 bytes at 0x600000 time 1 value 0xcafe"
        );
        assert_eq!(reader.describe_event(&Event::ufo()).unwrap(), "No event");
    }

    #[test]
    fn test_rejects_database_without_events() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (x INTEGER);")
            .unwrap();

        assert!(matches!(
            TraceReader::open(&path),
            Err(Error::InvalidTrace(_))
        ));
    }

    #[test]
    fn test_writer_replaces_wal_journal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("PRAGMA journal_mode = WAL;")
            .unwrap();
        write_trace(&path);

        let reader = TraceReader::open(&path).unwrap();
        let mode: String = reader
            .conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "delete");
        assert_eq!(reader.stats().unwrap().events, 5);
    }

    #[test]
    fn test_describe_event_without_stored_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.db");
        write_trace(&path);
        let reader = TraceReader::open(&path).unwrap();

        let missing = event(99, 7, 0x60_0010, 2, EventType::READ, 0x1f);
        assert_eq!(
            reader.describe_event(&missing).unwrap(),
            "#99 R 2 bytes at 0x600010 time 7 value 0x1f"
        );
    }

    #[test]
    fn test_writer_rejects_out_of_order_time() {
        let dir = tempdir().unwrap();
        let mut writer = TraceWriter::create(&dir.path().join("t.db")).unwrap();
        writer
            .append(event(1, 10, 0x1000, 1, EventType::READ, 0), "")
            .unwrap();

        let err = writer
            .append(event(2, 9, 0x1000, 1, EventType::READ, 0), "")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTrace(_)));
        let err = writer
            .append(event(3, u64::MAX, 0x1000, 1, EventType::READ, 0), "")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTrace(_)));
    }
}
