use std::fmt;
use std::sync::Arc;
use parking_lot::RwLock;
use log::{debug, error, warn};

use crate::common::types::{FileId, FrameId, Page, PageId, PagePtr};
use crate::storage::buffer::descriptor::FrameDescriptor;
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::page_table::PageTable;
use crate::storage::buffer::replacer::ClockReplacer;
use crate::storage::disk::PageStore;

/// Fixed-size in-memory page cache mediating every access to on-disk
/// pages.
///
/// Three structures move in lockstep: the frame pool (page contents), the
/// descriptor table (per-frame identity, flags, pin count) and the page
/// table ((file, page) -> frame). Every operation leaves them mutually
/// consistent. Pin counts are the sole admission control: a page with an
/// outstanding holder is never evicted.
///
/// Single logical thread of control; callers needing concurrent access
/// must serialize externally.
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<PagePtr>,
    descriptors: Vec<FrameDescriptor>,
    page_table: PageTable,
    replacer: ClockReplacer,
}

impl BufferPoolManager {
    /// Create a pool with `pool_size` frames, all empty.
    pub fn new(pool_size: usize) -> Self {
        let frames = (0..pool_size)
            .map(|_| Arc::new(RwLock::new(Page::new(0))))
            .collect();
        let descriptors = (0..pool_size).map(|_| FrameDescriptor::new()).collect();

        Self {
            pool_size,
            frames,
            descriptors,
            page_table: PageTable::new(pool_size),
            replacer: ClockReplacer::new(pool_size),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Fetch a page, reading it from the store on a cache miss. The
    /// returned page is counted as held; every fetch must be paired with
    /// an `unpin_page`.
    pub fn fetch_page(
        &mut self,
        file: &Arc<dyn PageStore>,
        page_id: PageId,
    ) -> Result<PagePtr, BufferPoolError> {
        if let Some(frame_id) = self.page_table.lookup(file.id(), page_id) {
            self.pin(frame_id);
            return Ok(self.frames[frame_id as usize].clone());
        }

        let frame_id = self.allocate_frame()?;
        let idx = frame_id as usize;

        {
            let mut page = self.frames[idx].write();
            file.read_page(page_id, &mut page)?;
        }

        self.page_table.insert(file.id(), page_id, frame_id)?;
        self.descriptors[idx].set(file.clone(), page_id);
        self.pin(frame_id);

        Ok(self.frames[idx].clone())
    }

    /// Release one hold on a page. Fails with `PageNotFound` if the page
    /// is not resident and `PageNotPinned` if its pin count is already
    /// zero. The dirty flag is sticky: passing `false` never clears it.
    pub fn unpin_page(
        &mut self,
        file: &Arc<dyn PageStore>,
        page_id: PageId,
        mark_dirty: bool,
    ) -> Result<(), BufferPoolError> {
        let file_id = file.id();
        let frame_id = self
            .page_table
            .lookup(file_id, page_id)
            .ok_or(BufferPoolError::PageNotFound { file_id, page_id })?;

        let desc = &mut self.descriptors[frame_id as usize];
        if desc.pin_count == 0 {
            return Err(BufferPoolError::PageNotPinned {
                file_id,
                page_id,
                frame_id,
            });
        }
        desc.pin_count -= 1;

        if mark_dirty {
            desc.dirty = true;
        }

        Ok(())
    }

    /// Write back every dirty page of `file` and drop all of the file's
    /// pages from the pool. Aborts with `PageStillPinned` at the first
    /// in-use page, leaving frames already processed in their flushed
    /// state.
    pub fn flush_file(&mut self, file: &Arc<dyn PageStore>) -> Result<(), BufferPoolError> {
        let file_id = file.id();

        for idx in 0..self.pool_size {
            let frame_id = idx as FrameId;
            let (page_id, dirty) = {
                let desc = &self.descriptors[idx];
                let Some(owner) = desc.file.as_ref() else {
                    continue;
                };
                if owner.id() != file_id {
                    continue;
                }
                if !desc.valid {
                    // Ownership by an invalid frame is a corruption
                    // signal, not a normal condition.
                    return Err(BufferPoolError::InconsistentFrameState {
                        frame_id,
                        valid: desc.valid,
                        dirty: desc.dirty,
                        ref_bit: desc.ref_bit,
                    });
                }
                if desc.pin_count > 0 {
                    return Err(BufferPoolError::PageStillPinned {
                        file_id,
                        page_id: desc.page_id,
                        frame_id,
                    });
                }
                (desc.page_id, desc.dirty)
            };

            if dirty {
                let page = self.frames[idx].read().clone();
                file.write_page(&page)?;
                self.descriptors[idx].dirty = false;
            }

            self.page_table.remove(file_id, page_id)?;
            self.descriptors[idx].reset();
        }

        Ok(())
    }

    /// Reserve a fresh page on the store and cache it, returning the new
    /// page number and its contents, already counted as held.
    pub fn allocate_new_page(
        &mut self,
        file: &Arc<dyn PageStore>,
    ) -> Result<(PageId, PagePtr), BufferPoolError> {
        let new_page = file.allocate_page()?;
        let page_id = new_page.page_id;

        let frame_id = self.allocate_frame()?;
        let idx = frame_id as usize;

        *self.frames[idx].write() = new_page;

        self.page_table.insert(file.id(), page_id, frame_id)?;
        self.descriptors[idx].set(file.clone(), page_id);
        self.pin(frame_id);

        Ok((page_id, self.frames[idx].clone()))
    }

    /// Evict a page unconditionally and delete it from the store. The
    /// backing storage is being destroyed, so the usual pin and dirty
    /// checks do not apply; no write-back is issued.
    pub fn dispose_page(
        &mut self,
        file: &Arc<dyn PageStore>,
        page_id: PageId,
    ) -> Result<(), BufferPoolError> {
        let file_id = file.id();
        let frame_id = self
            .page_table
            .lookup(file_id, page_id)
            .ok_or(BufferPoolError::PageNotFound { file_id, page_id })?;

        self.descriptors[frame_id as usize].reset();
        self.page_table.remove(file_id, page_id)?;

        file.delete_page(page_id)?;

        Ok(())
    }

    /// Diagnostic snapshot of every frame's identity, flags and pin count.
    pub fn status(&self) -> PoolStatus {
        let frames: Vec<FrameStatus> = self
            .descriptors
            .iter()
            .enumerate()
            .map(|(idx, desc)| FrameStatus {
                frame_id: idx as FrameId,
                file_id: desc.file.as_ref().map(|f| f.id()),
                page_id: desc.page_id,
                valid: desc.valid,
                dirty: desc.dirty,
                ref_bit: desc.ref_bit,
                pin_count: desc.pin_count,
            })
            .collect();
        let valid_frames = frames.iter().filter(|f| f.valid).count();

        PoolStatus {
            frames,
            valid_frames,
        }
    }

    /// Pick a frame for reuse via the clock sweep, writing back the
    /// victim's contents when dirty and unmapping it. The returned frame
    /// is empty; the caller populates it. Fails with `PoolExhausted` when
    /// every frame is pinned, leaving residency untouched.
    fn allocate_frame(&mut self) -> Result<FrameId, BufferPoolError> {
        let Some(frame_id) = self.replacer.victim(&mut self.descriptors) else {
            warn!("buffer pool exhausted: all {} frames pinned", self.pool_size);
            return Err(BufferPoolError::PoolExhausted);
        };
        let idx = frame_id as usize;
        debug_assert!(self.descriptors[idx].evictable());

        if self.descriptors[idx].valid {
            let desc = &self.descriptors[idx];
            let file = desc.file.clone().ok_or(BufferPoolError::InconsistentFrameState {
                frame_id,
                valid: desc.valid,
                dirty: desc.dirty,
                ref_bit: desc.ref_bit,
            })?;
            let page_id = desc.page_id;

            if desc.dirty {
                debug!(
                    "evicting dirty page {} of file {} from frame {}",
                    page_id,
                    file.id(),
                    frame_id
                );
                let page = self.frames[idx].read().clone();
                file.write_page(&page)?;
            }

            self.page_table.remove(file.id(), page_id)?;
        }

        self.descriptors[idx].reset();
        Ok(frame_id)
    }

    /// Shared hit-path accounting: touch the reference bit and take a
    /// hold.
    fn pin(&mut self, frame_id: FrameId) {
        let desc = &mut self.descriptors[frame_id as usize];
        desc.ref_bit = true;
        desc.pin_count += 1;
    }
}

impl Drop for BufferPoolManager {
    /// Shutdown write-back: no holders remain at this point, so every
    /// dirty frame is flushed without regard to pin state. `Drop` cannot
    /// propagate, so failures are logged.
    fn drop(&mut self) {
        for idx in 0..self.pool_size {
            let desc = &self.descriptors[idx];
            if !(desc.valid && desc.dirty) {
                continue;
            }
            let Some(file) = desc.file.as_ref() else {
                continue;
            };
            let page = self.frames[idx].read().clone();
            if let Err(e) = file.write_page(&page) {
                error!(
                    "failed to write back page {} of file {} at shutdown: {}",
                    desc.page_id,
                    file.id(),
                    e
                );
            }
        }
    }
}

/// One frame's descriptor, as reported by [`BufferPoolManager::status`].
#[derive(Debug, Clone)]
pub struct FrameStatus {
    pub frame_id: FrameId,
    pub file_id: Option<FileId>,
    pub page_id: PageId,
    pub valid: bool,
    pub dirty: bool,
    pub ref_bit: bool,
    pub pin_count: u32,
}

/// Diagnostic dump of the whole pool.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    pub frames: Vec<FrameStatus>,
    pub valid_frames: usize,
}

impl PoolStatus {
    /// Pin count of a resident page, if any frame holds it.
    pub fn pin_count(&self, file_id: FileId, page_id: PageId) -> Option<u32> {
        self.frames
            .iter()
            .find(|f| f.valid && f.file_id == Some(file_id) && f.page_id == page_id)
            .map(|f| f.pin_count)
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            match frame.file_id {
                Some(file_id) => writeln!(
                    f,
                    "frame {}: file {} page {} dirty={} ref={} pins={}",
                    frame.frame_id,
                    file_id,
                    frame.page_id,
                    frame.dirty,
                    frame.ref_bit,
                    frame.pin_count
                )?,
                None => writeln!(f, "frame {}: empty", frame.frame_id)?,
            }
        }
        write!(f, "total valid frames: {}", self.valid_frames)
    }
}
