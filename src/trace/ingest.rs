use super::event::{Block, Event};
use super::{IndexState, TraceIndex};

impl TraceIndex {
    /// Place one event into the block covering its address.
    ///
    /// Callers must deliver events in non-decreasing `time` order across the
    /// whole stream; per-block event lists rely on it and it is only checked
    /// in debug builds.
    pub fn ingest(&mut self, event: Event) {
        debug_assert!(
            self.blocks.is_empty() || event.time >= self.total_time,
            "event {} at time {} arrived after time {}",
            event.id,
            event.time,
            self.total_time
        );
        if self.state == IndexState::Ready {
            tracing::warn!(
                id = event.id,
                "event ingested after compression, regions are stale until finish()"
            );
        }
        self.state = IndexState::Ingesting;

        // First block whose end lies past the address: either it covers the
        // address or it is where a new block must go.
        let idx = self
            .blocks
            .partition_point(|b| b.address < event.address && !b.contains(event.address));
        let covered = self
            .blocks
            .get(idx)
            .is_some_and(|b| b.contains(event.address));
        if !covered {
            self.blocks.insert(idx, Block::for_address(event.address));
        }

        self.blocks[idx].events.push(event);
        if event.time > self.total_time {
            self.total_time = event.time;
        }
    }

    /// Ingest every event of a time-ordered stream
    pub fn ingest_all<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            self.ingest(event);
        }
    }
}
