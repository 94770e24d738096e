use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{MemoryConfig, Policy};
use crate::memory_manager::{AccessOutcome, VirtualMemoryManager};
use crate::page::Page;
use crate::stats::{FrameSnapshot, MemoryStats, PageTableStats};
use crate::typedef::{PageNumber, ProcessId, VirtualAddress};
use crate::Result;

/// Cloneable handle to one [`VirtualMemoryManager`] shared between
/// simulated processes. Every operation holds the single manager lock for
/// its whole duration, covering the frame pool, all page tables and the
/// strategy state.
#[derive(Clone, Debug)]
pub struct SharedMemoryManager {
    inner: Arc<Mutex<VirtualMemoryManager>>,
}

impl SharedMemoryManager {
    pub fn new(config: MemoryConfig) -> Result<Self> {
        Ok(Self::from(VirtualMemoryManager::new(config)?))
    }

    pub fn allocate_pages(
        &self,
        process_id: ProcessId,
        num_pages: u64,
    ) -> Result<Range<PageNumber>> {
        self.inner.lock().allocate_pages(process_id, num_pages)
    }

    pub fn allocate_bytes(&self, process_id: ProcessId, size: u64) -> Result<VirtualAddress> {
        self.inner.lock().allocate_bytes(process_id, size)
    }

    pub fn access_memory(
        &self,
        process_id: ProcessId,
        virtual_address: VirtualAddress,
        is_write: bool,
    ) -> Result<AccessOutcome> {
        self.inner
            .lock()
            .access_memory(process_id, virtual_address, is_write)
    }

    pub fn free_pages(&self, process_id: ProcessId) -> usize {
        self.inner.lock().free_pages(process_id)
    }

    pub fn set_replacement_strategy(&self, policy: Policy) {
        self.inner.lock().set_replacement_strategy(policy)
    }

    pub fn get_memory_stats(&self) -> MemoryStats {
        self.inner.lock().get_memory_stats()
    }

    pub fn translate(
        &self,
        process_id: ProcessId,
        virtual_address: VirtualAddress,
    ) -> Result<Option<u64>> {
        self.inner.lock().translate(process_id, virtual_address)
    }

    pub fn page(&self, process_id: ProcessId, page_number: PageNumber) -> Option<Page> {
        self.inner.lock().page(process_id, page_number)
    }

    pub fn memory_map(&self) -> Vec<FrameSnapshot> {
        self.inner.lock().memory_map()
    }

    pub fn page_table_stats(&self, process_id: ProcessId) -> Option<PageTableStats> {
        self.inner.lock().page_table_stats(process_id)
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.inner.lock().check_invariants()
    }

    /// Runs `f` with the lock held, for callers that need several
    /// operations to appear atomic.
    pub fn with_manager<R>(&self, f: impl FnOnce(&mut VirtualMemoryManager) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<VirtualMemoryManager> for SharedMemoryManager {
    fn from(manager: VirtualMemoryManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }
}
