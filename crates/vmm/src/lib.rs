mod analyzer;
mod config;
mod frame;
mod memory_manager;
mod page;
mod replacer;
mod shared_manager;
mod stats;
mod typedef;

pub use analyzer::{
    analyze_algorithm, compare_algorithms, fault_curve, reference_trace, Access, PolicyReport,
};
pub use config::{MemoryConfig, Policy, DEFAULT_PAGE_SIZE, DEFAULT_PHYSICAL_MEMORY_SIZE};
pub use memory_manager::{AccessKind, AccessOutcome, Eviction, VirtualMemoryManager};
pub use page::{Page, PageKey, PageState};
pub use shared_manager::SharedMemoryManager;
pub use stats::{FrameSnapshot, MemoryStats, PageTableStats};
pub use typedef::{FrameId, PageNumber, ProcessId, Tick, VirtualAddress, INVALID_PROCESS_ID};

pub use pagesim_error::Error;

pub type Result<T> = std::result::Result<T, pagesim_error::Error>;
