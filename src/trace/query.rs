use super::TraceIndex;
use super::event::{Event, EventType, INVALID_ADDRESS};
use crate::viewport::{ScreenPoint, ScreenRect, Viewport};
use std::fmt;

/// Read/write tag of a range report annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// One accessed value inside a range report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AccessKind,
    /// Fixed-width uppercase hex of the accessed value
    pub text: String,
}

/// Everything a rectangular selection covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeReport {
    pub address_start: u64,
    pub address_end: u64,
    pub time_start: u64,
    pub time_end: u64,
    pub annotations: Vec<Annotation>,
}

impl fmt::Display for RangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Address: 0x{:x} - 0x{:x}",
            self.address_start, self.address_end
        )?;
        writeln!(f, "Time: {} - {}", self.time_start, self.time_end)?;
        write!(f, "Data:")?;
        for annotation in &self.annotations {
            let tag = match annotation.kind {
                AccessKind::Read => 'R',
                AccessKind::Write => 'W',
            };
            write!(f, " {}:{}", tag, annotation.text)?;
        }
        Ok(())
    }
}

/// Format an accessed value as hex sized to the access width.
///
/// # Panics
///
/// Panics if `size` is not 1, 2, 4 or 8 bytes. Such an event means the trace
/// is corrupt and there is no sensible width to guess.
pub fn format_value(size: u32, value: u64) -> String {
    match size {
        1 => format!("{:02X}", value),
        2 => format!("{:04X}", value),
        4 => format!("{:08X}", value),
        8 => format!("{:016X}", value),
        _ => panic!("bad access size {size} in trace, cannot format value 0x{value:x}"),
    }
}

impl TraceIndex {
    /// Real address under a screen x coordinate
    pub fn address_at(&self, viewport: &Viewport, x: i32) -> u64 {
        self.display_to_real(viewport.display_address_at(x))
    }

    /// Event under a screen point, or [`Event::ufo`] if there is none.
    ///
    /// Events narrower than `size_px` screen units are widened to that size so
    /// they stay clickable when zoomed out.
    pub fn point_query(&self, viewport: &Viewport, pos: ScreenPoint) -> Event {
        let address = self.address_at(viewport, pos.x);
        if address == INVALID_ADDRESS {
            return Event::ufo();
        }
        let time = viewport.time_at(pos.y);

        let min_duration = ((viewport.size_px as f64 / viewport.time_zoom_factor) as u64).max(1);
        let min_width = (viewport.size_px as f64 / viewport.address_zoom_factor) as u64;

        let idx = self
            .blocks
            .partition_point(|b| b.address < address && !b.contains(address));
        let Some(block) = self.blocks.get(idx).filter(|b| b.contains(address)) else {
            return Event::ufo();
        };

        for event in &block.events {
            if time < event.time {
                break;
            }
            let width = (event.size as u64).max(min_width);
            if time - event.time < min_duration
                && address >= event.address
                && address - event.address < width
            {
                return *event;
            }
        }
        Event::ufo()
    }

    /// Collect the read and write values inside a screen rectangle.
    ///
    /// Only a block that encloses the whole address span of the rectangle is
    /// searched; selections straddling a block boundary or reaching past the
    /// end of the trace report no data.
    pub fn range_query(&self, viewport: &Viewport, rect: ScreenRect) -> RangeReport {
        let rect = rect.normalized();
        let address_start = self.address_at(viewport, rect.top_left.x);
        let time_start = viewport.time_at(rect.top_left.y);
        let address_end = self.address_at(viewport, rect.bottom_right.x);
        let time_end = viewport.time_at(rect.bottom_right.y);

        let mut annotations = Vec::new();
        let off_trace = address_start == INVALID_ADDRESS || address_end == INVALID_ADDRESS;
        let blocks = if off_trace { &[][..] } else { &self.blocks[..] };
        for block in blocks {
            if address_end < block.address {
                break;
            }
            if !block.encloses(address_start, address_end) {
                continue;
            }
            for event in &block.events {
                if time_end < event.time {
                    break;
                }
                let kind = match event.kind {
                    EventType::READ => AccessKind::Read,
                    EventType::WRITE => AccessKind::Write,
                    _ => continue,
                };
                if (time_start..=time_end).contains(&event.time)
                    && (address_start..=address_end).contains(&event.address)
                {
                    annotations.push(Annotation {
                        kind,
                        text: format_value(event.size, event.value),
                    });
                }
            }
        }

        RangeReport {
            address_start,
            address_end,
            time_start,
            time_end,
            annotations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(time: u64, address: u64, size: u32, kind: EventType, value: u64) -> Event {
        Event {
            time,
            address,
            size,
            id: time as i64,
            kind,
            value,
        }
    }

    fn unit_viewport() -> Viewport {
        Viewport::default()
    }

    fn point(x: u64, y: u64) -> ScreenPoint {
        ScreenPoint::new(x as i32, y as i32)
    }

    #[test]
    fn test_point_query_exact_hit_and_boundaries() {
        let mut index = TraceIndex::new();
        index.ingest(event(5, 0x1010, 1, EventType::READ, 0xAB));
        index.finish();
        let viewport = unit_viewport();
        let x = index.real_to_display(0x1010);

        let hit = index.point_query(&viewport, point(x, 5));
        assert_eq!(hit.id, 5);
        assert_eq!(hit.address, 0x1010);

        assert!(index.point_query(&viewport, point(x + 1, 5)).is_ufo());
        assert!(index.point_query(&viewport, point(x, 6)).is_ufo());
        assert!(index.point_query(&viewport, point(x, 4)).is_ufo());
    }

    #[test]
    fn test_point_query_respects_event_size() {
        let mut index = TraceIndex::new();
        index.ingest(event(1, 0x2000, 8, EventType::WRITE, 0));
        index.finish();
        let viewport = unit_viewport();

        assert_eq!(index.point_query(&viewport, point(7, 1)).id, 1);
        assert!(index.point_query(&viewport, point(8, 1)).is_ufo());
    }

    #[test]
    fn test_point_query_widens_small_events_when_zoomed_out() {
        let mut index = TraceIndex::new();
        index.ingest(event(100, 0x3000, 1, EventType::READ, 0));
        index.finish();
        let viewport = Viewport {
            address_zoom_factor: 0.25,
            time_zoom_factor: 0.5,
            size_px: 2,
            ..Viewport::default()
        };

        // x=1 -> display 4, y=50 -> time 100; widened to 8 bytes and 4 ticks
        assert_eq!(index.point_query(&viewport, point(1, 50)).id, 100);
        assert_eq!(index.point_query(&viewport, point(0, 51)).id, 100);
        assert!(index.point_query(&viewport, point(0, 52)).is_ufo());
        assert!(index.point_query(&viewport, point(2, 50)).is_ufo());
    }

    #[test]
    fn test_point_query_outside_display_space() {
        let mut index = TraceIndex::new();
        index.ingest(event(0, 0x1000, 1, EventType::READ, 0));
        index.finish();
        let viewport = unit_viewport();

        assert!(index.point_query(&viewport, point(0x1000, 0)).is_ufo());
        assert!(TraceIndex::new().point_query(&viewport, point(0, 0)).is_ufo());
    }

    #[test]
    fn test_queries_past_trace_end_miss_top_page() {
        let mut index = TraceIndex::new();
        index.ingest_all([
            event(0, 0x1000, 1, EventType::READ, 0x1),
            event(1, u64::MAX - 7, 8, EventType::READ, 0x42),
        ]);
        index.finish();
        let viewport = unit_viewport();
        assert_eq!(index.address_at(&viewport, 0x2000), INVALID_ADDRESS);

        assert_eq!(index.point_query(&viewport, point(0x1ff8, 1)).id, 1);
        assert!(index.point_query(&viewport, point(0x2000, 1)).is_ufo());
        assert!(index.point_query(&viewport, point(0x5000, 1)).is_ufo());

        let inside = index.range_query(
            &viewport,
            ScreenRect::new(ScreenPoint::new(0x1ff8, 0), ScreenPoint::new(0x1ffe, 1)),
        );
        assert_eq!(inside.annotations.len(), 1);
        assert_eq!(inside.annotations[0].text, "0000000000000042");

        let past_end = index.range_query(
            &viewport,
            ScreenRect::new(ScreenPoint::new(0x1ff8, 0), ScreenPoint::new(0x2000, 1)),
        );
        assert_eq!(past_end.address_end, INVALID_ADDRESS);
        assert!(past_end.annotations.is_empty());
    }

    #[test]
    fn test_range_query_single_write() {
        let mut index = TraceIndex::new();
        index.ingest(event(3, 0x1010, 4, EventType::WRITE, 0xdead_beef));
        index.finish();
        let viewport = unit_viewport();
        let x = index.real_to_display(0x1010) as i32;

        let report = index.range_query(
            &viewport,
            ScreenRect::new(ScreenPoint::new(x, 3), ScreenPoint::new(x, 3)),
        );

        assert_eq!(report.annotations.len(), 1);
        assert_eq!(report.annotations[0].kind, AccessKind::Write);
        assert_eq!(report.annotations[0].text, "DEADBEEF");
        assert_eq!(report.address_start, 0x1010);
        assert_eq!(report.time_end, 3);
    }

    #[test]
    fn test_range_query_filters_kinds_and_bounds() {
        let mut index = TraceIndex::new();
        index.ingest_all([
            event(1, 0x1000, 1, EventType::READ, 0x7),
            event(2, 0x1004, 2, EventType::INS, 0),
            event(3, 0x1008, 8, EventType::READ | EventType::WRITE, 0),
            event(4, 0x1010, 2, EventType::WRITE, 0xbeef),
            event(9, 0x1010, 1, EventType::READ, 0x1),
        ]);
        index.finish();
        let viewport = unit_viewport();

        // Corners given bottom-right first to exercise normalization
        let report = index.range_query(
            &viewport,
            ScreenRect::new(ScreenPoint::new(0x20, 5), ScreenPoint::new(0, 0)),
        );

        let texts: Vec<&str> = report.annotations.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["07", "BEEF"]);
        assert_eq!(
            report.to_string(),
            "Address: 0x1000 - 0x1020\nTime: 0 - 5\nData: R:07 W:BEEF"
        );
    }

    #[test]
    fn test_range_query_across_blocks_reports_nothing() {
        let mut index = TraceIndex::new();
        index.ingest_all([
            event(1, 0x1ff0, 1, EventType::READ, 0x1),
            event(2, 0x2010, 1, EventType::READ, 0x2),
        ]);
        index.finish();
        let viewport = unit_viewport();

        let report = index.range_query(
            &viewport,
            ScreenRect::new(ScreenPoint::new(0xff0, 0), ScreenPoint::new(0x1010, 5)),
        );
        assert!(report.annotations.is_empty());
    }

    #[test]
    fn test_format_value_widths() {
        assert_eq!(format_value(1, 0xa), "0A");
        assert_eq!(format_value(2, 0xa), "000A");
        assert_eq!(format_value(4, 0xa), "0000000A");
        assert_eq!(format_value(8, u64::MAX), "FFFFFFFFFFFFFFFF");
    }

    #[test]
    #[should_panic(expected = "bad access size")]
    fn test_format_value_rejects_odd_size() {
        format_value(3, 0);
    }
}
