// Buffer pool manager for a disk-backed storage engine

pub mod common;
pub mod storage;

// Re-export key items for convenient access
pub use common::types::{FileId, FrameId, Page, PagePtr, PageId, PAGE_SIZE};
pub use storage::buffer::{BufferPoolError, BufferPoolManager, FrameStatus, PoolStatus};
pub use storage::disk::{DiskManager, DiskManagerError, PageStore};
