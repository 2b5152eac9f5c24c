use super::TraceIndex;
use super::event::INVALID_ADDRESS;

impl TraceIndex {
    /// Translate a real address into the compressed display space.
    ///
    /// Returns [`INVALID_ADDRESS`] for addresses outside every region.
    pub fn real_to_display(&self, address: u64) -> u64 {
        // Regions are sorted and disjoint, the last one starting at or before
        // the address is the only candidate.
        let idx = self.regions.partition_point(|r| r.address <= address);
        match idx.checked_sub(1).map(|i| &self.regions[i]) {
            Some(region) if region.contains(address) => {
                address - region.address + region.display_address
            }
            _ => INVALID_ADDRESS,
        }
    }

    /// Translate a display address back into real address space.
    ///
    /// Returns [`INVALID_ADDRESS`] past the end of the display space.
    pub fn display_to_real(&self, address: u64) -> u64 {
        let idx = self.regions.partition_point(|r| r.display_address <= address);
        match idx.checked_sub(1).map(|i| &self.regions[i]) {
            Some(region) if region.contains_display(address) => {
                address - region.display_address + region.address
            }
            _ => INVALID_ADDRESS,
        }
    }
}
