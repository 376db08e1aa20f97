use thiserror::Error;
use crate::common::types::{FileId, FrameId, PageId};
use crate::storage::buffer::page_table::PageTableError;
use crate::storage::disk::DiskManagerError;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("buffer pool exhausted: every frame is pinned")]
    PoolExhausted,
    #[error("page {page_id} of file {file_id} is not resident in the buffer pool")]
    PageNotFound { file_id: FileId, page_id: PageId },
    #[error("page {page_id} of file {file_id} in frame {frame_id} is not pinned")]
    PageNotPinned {
        file_id: FileId,
        page_id: PageId,
        frame_id: FrameId,
    },
    #[error("page {page_id} of file {file_id} in frame {frame_id} is still pinned")]
    PageStillPinned {
        file_id: FileId,
        page_id: PageId,
        frame_id: FrameId,
    },
    #[error(
        "frame {frame_id} is in an inconsistent state (valid={valid}, dirty={dirty}, ref_bit={ref_bit})"
    )]
    InconsistentFrameState {
        frame_id: FrameId,
        valid: bool,
        dirty: bool,
        ref_bit: bool,
    },
    #[error("disk manager error: {0}")]
    DiskManagerError(#[from] DiskManagerError),
    #[error("page table error: {0}")]
    PageTableError(#[from] PageTableError),
}
