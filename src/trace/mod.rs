//! Address/time index over a memory-access trace.
//!
//! Events are pushed in time order into page-sized blocks keyed by address.
//! Once ingestion finishes, contiguous blocks are merged into regions and
//! every block gets a compact display address, so the whole occupied address
//! space can be shown without the empty gaps between regions.

mod event;
mod ingest;
mod mapper;
mod query;
mod region;

pub use event::{Block, Event, EventType, INVALID_ADDRESS, PAGE_SIZE, Region};
pub use query::{AccessKind, Annotation, RangeReport, format_value};

/// Lifecycle of a loaded trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexState {
    #[default]
    Empty,
    Ingesting,
    Ready,
}

/// Owns the blocks and regions of one trace load
#[derive(Debug, Default)]
pub struct TraceIndex {
    /// Sorted by address, non-overlapping
    blocks: Vec<Block>,
    /// Sorted by address, covers exactly the union of the blocks
    regions: Vec<Region>,
    total_time: u64,
    total_bytes: u64,
    state: IndexState,
}

impl TraceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, ready for a new trace load
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.regions.clear();
        self.total_time = 0;
        self.total_bytes = 0;
        self.state = IndexState::Empty;
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == IndexState::Ready
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Largest event time seen so far
    pub fn total_time(&self) -> u64 {
        self.total_time
    }

    /// Size of the compressed display address space
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn event_count(&self) -> usize {
        self.blocks.iter().map(|b| b.events.len()).sum()
    }
}
