use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use parking_lot::Mutex;
use tempfile::NamedTempFile;

use pagecache::{
    BufferPoolManager, DiskManager, DiskManagerError, FileId, Page, PageId, PageStore,
};

// Create a buffer pool plus a file-backed store on a temporary database
pub fn create_test_pool(
    pool_size: usize,
) -> Result<(BufferPoolManager, Arc<dyn PageStore>, NamedTempFile)> {
    let file = NamedTempFile::new()?;
    let store: Arc<dyn PageStore> = Arc::new(DiskManager::new(file.path())?);
    Ok((BufferPoolManager::new(pool_size), store, file))
}

// Stub ids start well above what the disk layer hands out, so the two
// store kinds can share a pool in a test.
static NEXT_STUB_ID: AtomicU32 = AtomicU32::new(10_000);

/// In-memory page store that journals every write and delete, so tests can
/// assert exactly which disk traffic an operation produced.
pub struct MemStore {
    file_id: FileId,
    pages: Mutex<HashMap<PageId, Page>>,
    next_page_id: AtomicU32,
    writes: Mutex<Vec<PageId>>,
    deletes: Mutex<Vec<PageId>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            file_id: NEXT_STUB_ID.fetch_add(1, Ordering::Relaxed),
            pages: Mutex::new(HashMap::new()),
            next_page_id: AtomicU32::new(1),
            writes: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    /// Pre-populate `n` pages (numbered 1..=n) without going through the
    /// buffer pool.
    pub fn with_pages(n: u32) -> Self {
        let store = Self::new();
        for _ in 0..n {
            store.allocate_page().unwrap();
        }
        store
    }

    pub fn writes(&self) -> Vec<PageId> {
        self.writes.lock().clone()
    }

    pub fn deletes(&self) -> Vec<PageId> {
        self.deletes.lock().clone()
    }

    pub fn write_count(&self, page_id: PageId) -> usize {
        self.writes.lock().iter().filter(|&&p| p == page_id).count()
    }

    /// Persisted contents of a page, as the store last saw them.
    pub fn stored_page(&self, page_id: PageId) -> Option<Page> {
        self.pages.lock().get(&page_id).cloned()
    }
}

impl PageStore for MemStore {
    fn id(&self) -> FileId {
        self.file_id
    }

    fn read_page(&self, page_id: PageId, page: &mut Page) -> Result<(), DiskManagerError> {
        match self.pages.lock().get(&page_id) {
            Some(stored) => {
                *page = stored.clone();
                Ok(())
            }
            None => Err(DiskManagerError::PageNotOnDisk {
                file_id: self.file_id,
                page_id,
            }),
        }
    }

    fn write_page(&self, page: &Page) -> Result<(), DiskManagerError> {
        self.writes.lock().push(page.page_id);
        self.pages.lock().insert(page.page_id, page.clone());
        Ok(())
    }

    fn allocate_page(&self) -> Result<Page, DiskManagerError> {
        let page_id = self.next_page_id.fetch_add(1, Ordering::Relaxed);
        let page = Page::new(page_id);
        self.pages.lock().insert(page_id, page.clone());
        Ok(page)
    }

    fn delete_page(&self, page_id: PageId) -> Result<(), DiskManagerError> {
        self.deletes.lock().push(page_id);
        self.pages.lock().remove(&page_id);
        Ok(())
    }
}
