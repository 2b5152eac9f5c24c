//! Text trace import.
//!
//! One event per line: `time kind address size value [description...]`.
//! `kind` is `R`, `W`, `RW` or `I`; numbers are decimal or `0x` hex. Blank
//! lines and lines starting with `#` are skipped.

use crate::cli::parse_u64;
use crate::error::{Error, Result};
use crate::storage::TraceWriter;
use crate::trace::{Event, EventType};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn parse_kind(s: &str) -> Option<EventType> {
    match s.to_ascii_uppercase().as_str() {
        "R" => Some(EventType::READ),
        "W" => Some(EventType::WRITE),
        "RW" => Some(EventType::READ | EventType::WRITE),
        "I" | "INS" => Some(EventType::INS),
        _ => None,
    }
}

/// Split off the next whitespace separated field
fn split_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

/// Parse one line into an event and its description
pub fn parse_line(line_no: usize, id: i64, line: &str) -> Result<Option<(Event, String)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let bad = |what: &str| Error::InvalidTrace(format!("line {}: {}", line_no, what));
    let mut rest = line;
    let mut next = |name: &str| match split_field(rest) {
        Some((field, tail)) => {
            rest = tail;
            Ok(field)
        }
        None => Err(bad(&format!("missing {name}"))),
    };

    let time = parse_u64(next("time")?).map_err(|e| bad(&e))?;
    let kind_str = next("kind")?;
    let kind = parse_kind(kind_str).ok_or_else(|| bad(&format!("unknown kind '{kind_str}'")))?;
    let address = parse_u64(next("address")?).map_err(|e| bad(&e))?;
    let size = parse_u64(next("size")?).map_err(|e| bad(&e))?;
    let value = parse_u64(next("value")?).map_err(|e| bad(&e))?;
    let description = rest.trim().to_string();

    // Memory accesses are reported as fixed-width values later on
    let size_ok = if kind == EventType::INS {
        (1..=15).contains(&size)
    } else {
        matches!(size, 1 | 2 | 4 | 8)
    };
    if !size_ok {
        return Err(bad(&format!("invalid size {} for {} event", size, kind)));
    }

    Ok(Some((
        Event {
            time,
            address,
            size: size as u32,
            id,
            kind,
            value,
        },
        description,
    )))
}

pub fn run(input: &Path, output: &Path) -> Result<()> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = TraceWriter::create(output)?;
    writer.set_meta("source", &input.display().to_string())?;

    let mut next_id = 1i64;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some((event, description)) = parse_line(i + 1, next_id, &line)? {
            writer.append(event, &description).map_err(|e| match e {
                Error::InvalidTrace(msg) => Error::InvalidTrace(format!("line {}: {}", i + 1, msg)),
                e => e,
            })?;
            next_id += 1;
        }
    }

    let count = writer.commit()?;
    println!("Imported {} events into {}", count, output.display());
    Ok(())
}
