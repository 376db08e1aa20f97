use std::sync::Arc;

use crate::common::types::PageId;
use crate::storage::disk::PageStore;

/// Per-frame metadata driving eviction and correctness checks.
///
/// State machine: empty -> resident (set) -> empty (reset), with the pin
/// count fluctuating between 0 and the number of live holders while
/// resident. A frame with a nonzero pin count must never be evicted.
pub(crate) struct FrameDescriptor {
    pub(crate) file: Option<Arc<dyn PageStore>>,
    pub(crate) page_id: PageId,
    pub(crate) valid: bool,
    pub(crate) ref_bit: bool,
    pub(crate) dirty: bool,
    pub(crate) pin_count: u32,
}

impl FrameDescriptor {
    pub(crate) fn new() -> Self {
        Self {
            file: None,
            page_id: 0,
            valid: false,
            ref_bit: false,
            dirty: false,
            pin_count: 0,
        }
    }

    /// Bind the frame to a page. The frame starts unpinned; the fetch and
    /// allocate paths pin it through the same logic as a cache hit.
    pub(crate) fn set(&mut self, file: Arc<dyn PageStore>, page_id: PageId) {
        self.file = Some(file);
        self.page_id = page_id;
        self.valid = true;
        self.ref_bit = false;
        self.dirty = false;
        self.pin_count = 0;
    }

    /// Return the frame to the empty state.
    pub(crate) fn reset(&mut self) {
        self.file = None;
        self.page_id = 0;
        self.valid = false;
        self.ref_bit = false;
        self.dirty = false;
        self.pin_count = 0;
    }

    /// Eligible for reuse: empty, or resident but unpinned with the
    /// reference bit clear.
    pub(crate) fn evictable(&self) -> bool {
        !self.valid || (self.pin_count == 0 && !self.ref_bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_empty_state() {
        let mut desc = FrameDescriptor::new();
        desc.page_id = 7;
        desc.valid = true;
        desc.ref_bit = true;
        desc.dirty = true;
        desc.pin_count = 3;

        desc.reset();

        assert!(!desc.valid);
        assert!(!desc.dirty);
        assert!(!desc.ref_bit);
        assert_eq!(desc.pin_count, 0);
        assert!(desc.file.is_none());
        assert!(desc.evictable());
    }

    #[test]
    fn pinned_or_referenced_frames_are_not_evictable() {
        let mut desc = FrameDescriptor::new();
        desc.valid = true;
        desc.pin_count = 1;
        assert!(!desc.evictable());

        desc.pin_count = 0;
        desc.ref_bit = true;
        assert!(!desc.evictable());

        desc.ref_bit = false;
        assert!(desc.evictable());
    }
}
