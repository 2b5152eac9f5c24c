use super::event::Region;
use super::{IndexState, TraceIndex};

impl TraceIndex {
    /// Mark ingestion complete and build the display address space
    pub fn finish(&mut self) {
        self.compress();
        self.state = IndexState::Ready;
        tracing::debug!(
            blocks = self.blocks.len(),
            regions = self.regions.len(),
            total_bytes = self.total_bytes,
            total_time = self.total_time,
            "trace index ready"
        );
    }

    /// Merge address-contiguous blocks into regions and assign display addresses.
    ///
    /// Display addresses come from a single running counter that grows by each
    /// block's size, so unrelated regions sit back to back in display space.
    /// The region list is rebuilt from scratch on every call.
    pub fn compress(&mut self) {
        self.regions.clear();
        let mut cur_address = 0u64;
        let mut blocks = self.blocks.iter_mut().peekable();

        while let Some(first) = blocks.next() {
            let mut region = Region {
                address: first.address,
                size: first.size,
                display_address: cur_address,
            };
            first.display_address = cur_address;
            first.start_region = true;
            cur_address += first.size;

            while let Some(block) =
                blocks.next_if(|b| region.address.checked_add(region.size) == Some(b.address))
            {
                region.size += block.size;
                block.display_address = cur_address;
                block.start_region = false;
                cur_address += block.size;
            }
            self.regions.push(region);
        }

        self.total_bytes = self
            .regions
            .last()
            .map(|r| r.display_address + r.size)
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Event, EventType};

    fn index_with(addresses: &[u64]) -> TraceIndex {
        let mut index = TraceIndex::new();
        for (t, &address) in addresses.iter().enumerate() {
            index.ingest(Event {
                time: t as u64,
                address,
                size: 1,
                id: t as i64,
                kind: EventType::WRITE,
                value: 0,
            });
        }
        index.finish();
        index
    }

    #[test]
    fn test_gap_is_elided() {
        let index = index_with(&[0x1000, 0x3000]);

        let blocks = index.blocks();
        assert_eq!(blocks[0].display_address, 0);
        assert_eq!(blocks[1].display_address, 0x1000);
        assert!(blocks[0].start_region);
        assert!(blocks[1].start_region);
        assert_eq!(index.regions().len(), 2);
        assert_eq!(index.total_bytes(), 0x2000);
    }

    #[test]
    fn test_contiguous_blocks_form_one_region() {
        let index = index_with(&[0x2000, 0x1000, 0x3000, 0x8000]);

        assert_eq!(
            index.regions(),
            &[
                Region {
                    address: 0x1000,
                    size: 0x3000,
                    display_address: 0,
                },
                Region {
                    address: 0x8000,
                    size: 0x1000,
                    display_address: 0x3000,
                },
            ]
        );
        let starts: Vec<bool> = index.blocks().iter().map(|b| b.start_region).collect();
        assert_eq!(starts, vec![true, false, false, true]);
        assert_eq!(index.state(), IndexState::Ready);
    }

    #[test]
    fn test_total_bytes_is_sum_of_block_sizes() {
        let index = index_with(&[0x0, 0x1000, 0x10_0000, 0x7fff_f000, 0x7fff_e000, 0xdead_0000]);

        let sum: u64 = index.blocks().iter().map(|b| b.size).sum();
        assert_eq!(index.total_bytes(), sum);
    }

    #[test]
    fn test_compress_is_idempotent() {
        let mut index = index_with(&[0x5000, 0x1000, 0x6000, 0x40_0000]);
        let before: Vec<u64> = index.blocks().iter().map(|b| b.display_address).collect();
        let regions = index.regions().to_vec();

        index.compress();

        let after: Vec<u64> = index.blocks().iter().map(|b| b.display_address).collect();
        assert_eq!(before, after);
        assert_eq!(regions, index.regions());
    }

    #[test]
    fn test_empty_index() {
        let mut index = TraceIndex::new();
        index.finish();

        assert!(index.regions().is_empty());
        assert_eq!(index.total_bytes(), 0);
        assert!(index.is_ready());
    }
}
