use std::fmt;
use std::ops::BitOr;

/// Blocks are page sized, like memory pages on x86
pub const PAGE_SIZE: u64 = 0x1000;

/// Returned by coordinate translation when no region matches
pub const INVALID_ADDRESS: u64 = u64::MAX;

/// Access kind bitmask of a trace event
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventType(u8);

impl EventType {
    pub const READ: EventType = EventType(1);
    pub const WRITE: EventType = EventType(1 << 1);
    pub const INS: EventType = EventType(1 << 2);
    pub const UFO: EventType = EventType(1 << 3);

    pub const fn from_bits(bits: u8) -> Self {
        EventType(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: EventType) -> bool {
        self.0 & other.0 == other.0
    }

    /// Short label used in reports and the import format
    pub fn label(self) -> &'static str {
        match self {
            EventType::READ => "R",
            EventType::WRITE => "W",
            t if t == EventType::READ | EventType::WRITE => "RW",
            EventType::INS => "I",
            EventType::UFO => "UFO",
            _ => "?",
        }
    }
}

impl BitOr for EventType {
    type Output = EventType;

    fn bitor(self, rhs: EventType) -> EventType {
        EventType(self.0 | rhs.0)
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.label())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single memory access or executed instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: u64,
    pub address: u64,
    pub size: u32,
    pub id: i64,
    pub kind: EventType,
    pub value: u64,
}

impl Event {
    /// The "nothing here" event returned by point queries that miss
    pub fn ufo() -> Self {
        Event {
            time: 0,
            address: 0,
            size: 0,
            id: -1,
            kind: EventType::UFO,
            value: 0,
        }
    }

    pub fn is_ufo(&self) -> bool {
        self.kind == EventType::UFO
    }
}

/// Page-aligned span of real address space and the events that touched it
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub address: u64,
    pub size: u64,
    /// Sorted by time (non-decreasing)
    pub events: Vec<Event>,
    pub display_address: u64,
    pub start_region: bool,
}

impl Block {
    pub(crate) fn for_address(address: u64) -> Self {
        Block {
            address: address & !(PAGE_SIZE - 1),
            size: PAGE_SIZE,
            events: Vec::new(),
            display_address: 0,
            start_region: true,
        }
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.address && address - self.address < self.size
    }

    /// True when `[start, end]` lies inside this block (end may touch the block end)
    pub fn encloses(&self, start: u64, end: u64) -> bool {
        start >= self.address && end >= self.address && end - self.address <= self.size
    }
}

/// Maximal run of address-contiguous blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub address: u64,
    pub size: u64,
    pub display_address: u64,
}

impl Region {
    pub fn contains(&self, address: u64) -> bool {
        address >= self.address && address - self.address < self.size
    }

    pub fn contains_display(&self, address: u64) -> bool {
        address >= self.display_address && address - self.display_address < self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_page_aligned() {
        let block = Block::for_address(0x7fff_1234);
        assert_eq!(block.address, 0x7fff_1000);
        assert_eq!(block.size, PAGE_SIZE);
        assert!(block.contains(0x7fff_1234));
        assert!(!block.contains(0x7fff_2000));
        assert!(block.encloses(0x7fff_1000, 0x7fff_2000));
        assert!(!block.encloses(0x7fff_0fff, 0x7fff_1004));
    }

    #[test]
    fn test_event_type_labels() {
        assert_eq!(EventType::READ.label(), "R");
        assert_eq!((EventType::READ | EventType::WRITE).label(), "RW");
        assert!((EventType::READ | EventType::WRITE).contains(EventType::WRITE));
        assert!(!EventType::INS.contains(EventType::READ));
    }

    #[test]
    fn test_region_contains_top_of_address_space() {
        let region = Region {
            address: u64::MAX - 0xFFF,
            size: 0x1000,
            display_address: 0,
        };
        assert!(region.contains(u64::MAX));
        assert!(region.contains_display(0xFFF));
        assert!(!region.contains_display(0x1000));
    }
}
