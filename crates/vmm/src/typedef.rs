pub type ProcessId = u32;
pub type PageNumber = u64;
pub type FrameId = usize;
pub type VirtualAddress = u64;

/// Logical clock value. Advances once per successful access.
pub type Tick = u64;

/// Reserved sentinel; never a valid owner of pages.
pub const INVALID_PROCESS_ID: ProcessId = ProcessId::MAX;
