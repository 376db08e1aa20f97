use std::collections::HashMap;
use thiserror::Error;

use crate::common::types::{FileId, FrameId, PageId};

#[derive(Error, Debug)]
pub enum PageTableError {
    #[error("page {page_id} of file {file_id} already mapped to frame {frame_id}")]
    DuplicateKey {
        file_id: FileId,
        page_id: PageId,
        frame_id: FrameId,
    },
    #[error("page {page_id} of file {file_id} has no page table entry")]
    KeyNotFound { file_id: FileId, page_id: PageId },
}

/// Associative index from (file, page) to the frame caching that page.
/// Amortized O(1) lookup/insert/remove, no ordering guarantee.
pub(crate) struct PageTable {
    entries: HashMap<(FileId, PageId), FrameId>,
}

impl PageTable {
    /// Pre-sized proportionally to the pool capacity to keep the load
    /// factor low.
    pub(crate) fn new(pool_size: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(pool_size * 6 / 5 + 1),
        }
    }

    pub(crate) fn lookup(&self, file_id: FileId, page_id: PageId) -> Option<FrameId> {
        self.entries.get(&(file_id, page_id)).copied()
    }

    pub(crate) fn insert(
        &mut self,
        file_id: FileId,
        page_id: PageId,
        frame_id: FrameId,
    ) -> Result<(), PageTableError> {
        if let Some(&existing) = self.entries.get(&(file_id, page_id)) {
            return Err(PageTableError::DuplicateKey {
                file_id,
                page_id,
                frame_id: existing,
            });
        }
        self.entries.insert((file_id, page_id), frame_id);
        Ok(())
    }

    pub(crate) fn remove(&mut self, file_id: FileId, page_id: PageId) -> Result<(), PageTableError> {
        match self.entries.remove(&(file_id, page_id)) {
            Some(_) => Ok(()),
            None => Err(PageTableError::KeyNotFound { file_id, page_id }),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_lookup() {
        let mut table = PageTable::new(4);
        table.insert(1, 10, 2).unwrap();
        assert_eq!(table.lookup(1, 10), Some(2));
        assert_eq!(table.lookup(1, 11), None);
        assert_eq!(table.lookup(2, 10), None);
    }

    #[test]
    fn duplicate_insert_fails() {
        let mut table = PageTable::new(4);
        table.insert(1, 10, 2).unwrap();
        let err = table.insert(1, 10, 3).unwrap_err();
        assert!(matches!(err, PageTableError::DuplicateKey { frame_id: 2, .. }));
        // Existing mapping is untouched
        assert_eq!(table.lookup(1, 10), Some(2));
    }

    #[test]
    fn remove_absent_key_fails() {
        let mut table = PageTable::new(4);
        assert!(matches!(
            table.remove(1, 10),
            Err(PageTableError::KeyNotFound { file_id: 1, page_id: 10 })
        ));

        table.insert(1, 10, 0).unwrap();
        table.remove(1, 10).unwrap();
        assert_eq!(table.lookup(1, 10), None);
        assert_eq!(table.len(), 0);
    }
}
