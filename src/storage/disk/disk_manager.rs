use std::fs::{File, OpenOptions};
use std::io::{Read, Write, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{FileId, Page, PageId, PAGE_SIZE};

const INVALID_PAGE_ID: PageId = 0;

#[derive(Error, Debug)]
pub enum DiskManagerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),
    #[error("Page {page_id} does not exist in file {file_id}")]
    PageNotOnDisk { file_id: FileId, page_id: PageId },
}

/// Durable page storage for a single file. The buffer pool never touches
/// the disk directly; everything goes through this interface.
pub trait PageStore: Send + Sync {
    /// Stable identity distinguishing this file from every other open file.
    fn id(&self) -> FileId;

    /// Read a page from disk. Fails if the page does not exist.
    fn read_page(&self, page_id: PageId, page: &mut Page) -> Result<(), DiskManagerError>;

    /// Persist a page at the identity embedded in its contents.
    fn write_page(&self, page: &Page) -> Result<(), DiskManagerError>;

    /// Reserve a fresh page number and return its initial contents.
    fn allocate_page(&self) -> Result<Page, DiskManagerError>;

    /// Remove a page permanently.
    fn delete_page(&self, page_id: PageId) -> Result<(), DiskManagerError>;
}

static NEXT_FILE_ID: AtomicU32 = AtomicU32::new(1);

/// DiskManager is responsible for the actual disk I/O of one database file
pub struct DiskManager {
    file_id: FileId,
    db_file: Mutex<File>,
}

impl DiskManager {
    /// Open (or create) the database file at the given path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, DiskManagerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(db_path)?;

        Ok(Self {
            file_id: NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed),
            db_file: Mutex::new(file),
        })
    }

    /// Calculate the offset of a page in the file
    fn page_offset(&self, page_id: PageId) -> u64 {
        (page_id as u64 - 1) * PAGE_SIZE as u64
    }
}

impl PageStore for DiskManager {
    fn id(&self) -> FileId {
        self.file_id
    }

    fn read_page(&self, page_id: PageId, page: &mut Page) -> Result<(), DiskManagerError> {
        if page_id == INVALID_PAGE_ID {
            return Err(DiskManagerError::InvalidPageId(page_id));
        }

        let offset = self.page_offset(page_id);
        let mut buffer = [0u8; PAGE_SIZE];

        {
            let mut file = self.db_file.lock();

            let file_size = file.metadata()?.len();
            if offset >= file_size {
                return Err(DiskManagerError::PageNotOnDisk {
                    file_id: self.file_id,
                    page_id,
                });
            }

            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buffer)?;
        }

        page.data.copy_from_slice(&buffer);
        page.page_id = page_id;

        Ok(())
    }

    fn write_page(&self, page: &Page) -> Result<(), DiskManagerError> {
        if page.page_id == INVALID_PAGE_ID {
            return Err(DiskManagerError::InvalidPageId(page.page_id));
        }

        let offset = self.page_offset(page.page_id);

        let mut file = self.db_file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&page.data)?;
        file.flush()?;

        Ok(())
    }

    fn allocate_page(&self) -> Result<Page, DiskManagerError> {
        let mut file = self.db_file.lock();

        let file_size = file.metadata()?.len();
        let new_page_id = (file_size / PAGE_SIZE as u64) as PageId + 1;

        file.seek(SeekFrom::End(0))?;
        let zeros = [0u8; PAGE_SIZE];
        file.write_all(&zeros)?;
        file.flush()?;

        Ok(Page::new(new_page_id))
    }

    fn delete_page(&self, page_id: PageId) -> Result<(), DiskManagerError> {
        if page_id == INVALID_PAGE_ID {
            return Err(DiskManagerError::InvalidPageId(page_id));
        }

        // The on-disk format has no free list; the slot is zeroed and the
        // page number is never handed out again.
        let offset = self.page_offset(page_id);

        let mut file = self.db_file.lock();

        let file_size = file.metadata()?.len();
        if offset >= file_size {
            return Err(DiskManagerError::PageNotOnDisk {
                file_id: self.file_id,
                page_id,
            });
        }

        file.seek(SeekFrom::Start(offset))?;
        let zeros = [0u8; PAGE_SIZE];
        file.write_all(&zeros)?;
        file.flush()?;

        Ok(())
    }
}
