use crate::error::Result;
use crate::storage::TraceReader;
use crate::trace::TraceIndex;
use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL_CONDENSED};
use std::path::Path;
use std::time::Instant;

/// Per-region summary row
pub struct RegionSummary {
    pub address: u64,
    pub size: u64,
    pub display_address: u64,
    pub blocks: usize,
    pub events: usize,
}

/// Summarize the regions of a ready index
pub fn region_summaries(index: &TraceIndex) -> Vec<RegionSummary> {
    let mut summaries: Vec<RegionSummary> = index
        .regions()
        .iter()
        .map(|r| RegionSummary {
            address: r.address,
            size: r.size,
            display_address: r.display_address,
            blocks: 0,
            events: 0,
        })
        .collect();

    // Blocks and regions are both sorted, walk them together
    let mut current: Option<usize> = None;
    for block in index.blocks() {
        if block.start_region {
            current = Some(current.map_or(0, |c| c + 1));
        }
        if let Some(summary) = current.and_then(|c| summaries.get_mut(c)) {
            summary.blocks += 1;
            summary.events += block.events.len();
        }
    }
    summaries
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1}GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

pub fn run(file: &Path, show_regions: bool) -> Result<()> {
    let reader = TraceReader::open(file)?;

    let mut meta = Table::new();
    meta.load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["KEY", "VALUE"]);
    for (key, value) in reader.metadata()? {
        meta.add_row(vec![key, value]);
    }
    println!("{}", meta);

    let stats = reader.stats()?;
    let mut counts = Table::new();
    counts
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["EVENTS", "READ", "WRITE", "READ/WRITE", "INSTRUCTION"]);
    counts.add_row(
        [
            stats.events,
            stats.reads,
            stats.writes,
            stats.read_writes,
            stats.instructions,
        ]
        .map(|n| Cell::new(n).set_alignment(CellAlignment::Right)),
    );
    println!("{}", counts);

    let start = Instant::now();
    let mut index = TraceIndex::new();
    reader.load_into(&mut index)?;
    let elapsed = start.elapsed();

    println!(
        "Time span:     {} - {}",
        stats.first_time.unwrap_or(0),
        stats.last_time.unwrap_or(0)
    );
    println!(
        "Memory:        {} in {} pages, {} regions",
        format_bytes(index.total_bytes()),
        index.blocks().len(),
        index.regions().len()
    );
    println!(
        "Indexed in:    {}",
        humantime::format_duration(std::time::Duration::from_millis(elapsed.as_millis() as u64))
    );

    if show_regions {
        let mut regions = Table::new();
        regions.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
            "ADDRESS", "SIZE", "DISPLAY", "PAGES", "EVENTS",
        ]);
        for r in region_summaries(&index) {
            regions.add_row(vec![
                Cell::new(format!("0x{:x}", r.address)),
                Cell::new(format_bytes(r.size)).set_alignment(CellAlignment::Right),
                Cell::new(format!("0x{:x}", r.display_address)),
                Cell::new(r.blocks).set_alignment(CellAlignment::Right),
                Cell::new(r.events).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("{}", regions);
    }

    Ok(())
}
