pub mod error;
pub mod manager;
mod descriptor;
mod page_table;
mod replacer;

pub use error::BufferPoolError;
pub use manager::{BufferPoolManager, FrameStatus, PoolStatus};
pub use page_table::PageTableError;
