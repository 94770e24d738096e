use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Range;

use log::{debug, info, trace};
use pagesim_error::{erralloc, Error};
use serde::{Deserialize, Serialize};

use crate::config::{MemoryConfig, Policy};
use crate::frame::Frame;
use crate::page::{Page, PageKey, PageTable};
use crate::replacer::{ReplacementStrategy, Replacer, ResidentSet};
use crate::stats::{ratio, FrameSnapshot, MemoryStats, PageTableStats};
use crate::typedef::{
    FrameId, PageNumber, ProcessId, Tick, VirtualAddress, INVALID_PROCESS_ID,
};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    Hit,
    FaultServiced,
}

/// A resident page pushed out of its frame to service a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eviction {
    pub victim: PageKey,
    pub frame: FrameId,
    /// The victim was dirty. No I/O happens; the write-back is only reported.
    pub written_back: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessOutcome {
    pub kind: AccessKind,
    pub frame: FrameId,
    pub physical_address: u64,
    pub eviction: Option<Eviction>,
}

impl AccessOutcome {
    pub fn is_hit(&self) -> bool {
        self.kind == AccessKind::Hit
    }

    pub fn is_fault(&self) -> bool {
        self.kind == AccessKind::FaultServiced
    }
}

/// Demand-paged virtual memory over a fixed pool of frames shared by all
/// processes.
///
/// The manager is the single owner of the frame pool, every page table and
/// the active replacement strategy. Frames and pages refer to each other by
/// index and [`PageKey`] only. All methods take `&mut self`; wrap it in a
/// [`crate::SharedMemoryManager`] to share it between threads.
#[derive(Debug)]
pub struct VirtualMemoryManager {
    config: MemoryConfig,
    frames: Vec<Frame>,
    free_list: VecDeque<FrameId>,
    page_tables: HashMap<ProcessId, PageTable>,
    replacer: ReplacementStrategy,
    clock: Tick,
    page_faults: u64,
    hits: u64,
    evictions: u64,
    write_backs: u64,
}

impl VirtualMemoryManager {
    pub fn new(config: MemoryConfig) -> Result<Self> {
        config.validate()?;
        let frame_count = usize::try_from(config.total_frames())
            .map_err(|_| Error::Configuration("frame count overflows usize".to_string()))?;

        info!(
            "virtual memory manager: {} bytes, {} frames of {} bytes, {} replacement",
            config.physical_memory_size, frame_count, config.page_size, config.policy
        );

        Ok(Self {
            frames: (0..frame_count).map(Frame::new).collect(),
            free_list: (0..frame_count).collect(),
            page_tables: HashMap::new(),
            replacer: ReplacementStrategy::new(config.policy, frame_count),
            clock: 0,
            page_faults: 0,
            hits: 0,
            evictions: 0,
            write_backs: 0,
            config,
        })
    }

    pub fn page_size(&self) -> u64 {
        self.config.page_size
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn policy(&self) -> Policy {
        self.replacer.policy()
    }

    /// Adds `num_pages` pages to the process's virtual address space,
    /// numbered on from its highest page. Nothing is loaded; virtual
    /// allocation may exceed the number of physical frames.
    pub fn allocate_pages(
        &mut self,
        process_id: ProcessId,
        num_pages: u64,
    ) -> Result<Range<PageNumber>> {
        if process_id == INVALID_PROCESS_ID {
            return erralloc!("process id {process_id} is reserved");
        }
        if num_pages == 0 {
            return erralloc!("page count must be positive");
        }

        // The last page may end exactly at the top of the address space.
        let page_limit = (u64::MAX / self.config.page_size).saturating_add(1);
        let created = !self.page_tables.contains_key(&process_id);
        let table = self
            .page_tables
            .entry(process_id)
            .or_insert_with(|| PageTable::new(process_id));

        match table.allocate(num_pages, page_limit) {
            Ok(pages) => {
                debug!(
                    "allocated pages {}..{} to process {}",
                    pages.start, pages.end, process_id
                );
                Ok(pages)
            }
            Err(err) => {
                if created {
                    self.page_tables.remove(&process_id);
                }
                Err(err)
            }
        }
    }

    /// `malloc`-style allocation of `size` bytes, rounded up to whole
    /// pages. Returns the virtual address of the first new page.
    pub fn allocate_bytes(&mut self, process_id: ProcessId, size: u64) -> Result<VirtualAddress> {
        if size == 0 {
            return erralloc!("allocation size must be positive");
        }
        let page_size = self.config.page_size;
        let pages = self.allocate_pages(process_id, size.div_ceil(page_size))?;
        // Allocated pages never extend past the top of the address space.
        Ok(pages.start * page_size)
    }

    /// Performs one read or write. Hits refresh the page's access metadata;
    /// misses are serviced as page faults, evicting a victim when no frame
    /// is free. Unmapped addresses are errors and leave all counters alone.
    pub fn access_memory(
        &mut self,
        process_id: ProcessId,
        virtual_address: VirtualAddress,
        is_write: bool,
    ) -> Result<AccessOutcome> {
        let page_size = self.config.page_size;
        let page_number = virtual_address / page_size;
        let offset = virtual_address % page_size;

        let resident_frame = match self
            .page_tables
            .get(&process_id)
            .and_then(|table| table.get(page_number))
        {
            Some(page) => page.frame(),
            None => {
                return Err(Error::UnmappedAddress {
                    process_id,
                    virtual_address,
                })
            }
        };

        let now = self.tick();
        let key = PageKey::new(process_id, page_number);

        let (kind, frame, eviction) = match resident_frame {
            Some(frame) => {
                let page = Self::lookup_mut(&mut self.page_tables, key)?;
                page.touch(now, is_write);
                self.replacer.on_access(page);
                self.hits += 1;
                trace!("hit {key} in frame {frame}");
                (AccessKind::Hit, frame, None)
            }
            None => {
                let (frame, eviction) = self.handle_page_fault(key, now, is_write)?;
                (AccessKind::FaultServiced, frame, eviction)
            }
        };

        Ok(AccessOutcome {
            kind,
            frame,
            physical_address: frame as u64 * page_size + offset,
            eviction,
        })
    }

    fn handle_page_fault(
        &mut self,
        key: PageKey,
        now: Tick,
        is_write: bool,
    ) -> Result<(FrameId, Option<Eviction>)> {
        let (frame, eviction) = match self.free_list.pop_front() {
            Some(frame) => (frame, None),
            None => {
                let eviction = self.evict_victim()?;
                (eviction.frame, Some(eviction))
            }
        };

        if !self.frames[frame].is_free() {
            return Err(Error::InconsistentState(format!(
                "frame {frame} handed out for {key} while still occupied"
            )));
        }

        let page = Self::lookup_mut(&mut self.page_tables, key)?;
        page.load(frame, now, is_write);
        self.frames[frame].occupy(key);
        self.replacer.on_load(page);
        self.page_faults += 1;

        debug!("page fault: loaded {key} into frame {frame}");
        Ok((frame, eviction))
    }

    /// Asks the strategy for a victim and moves it out of its frame.
    fn evict_victim(&mut self) -> Result<Eviction> {
        let mut resident = ResidentSet::new(&self.frames, &mut self.page_tables);
        let victim = self.replacer.select_victim(&mut resident)?;

        let page = self
            .page_tables
            .get_mut(&victim.process_id)
            .and_then(|table| table.get_mut(victim.page_number))
            .filter(|page| page.is_resident())
            .ok_or_else(|| {
                Error::StrategyInvariantViolation(format!(
                    "{} chose {victim}, which is not resident",
                    self.replacer.policy()
                ))
            })?;

        let frame = page.frame().ok_or_else(|| {
            Error::InconsistentState(format!("resident page {victim} has no frame"))
        })?;
        if self.frames[frame].occupant() != Some(victim) {
            return Err(Error::InconsistentState(format!(
                "page {victim} claims frame {frame} held by {:?}",
                self.frames[frame].occupant()
            )));
        }

        let written_back = page.evict().is_some_and(|(_, dirty)| dirty);
        self.frames[frame].release();
        self.evictions += 1;

        if written_back {
            self.write_backs += 1;
            debug!("write-back of dirty page {victim} from frame {frame}");
        }
        debug!("evicted {victim} from frame {frame}");

        Ok(Eviction {
            victim,
            frame,
            written_back,
        })
    }

    /// Releases every page of the process and discards its page table.
    /// Returns the number of frames returned to the free pool; freeing an
    /// unknown process is a no-op.
    pub fn free_pages(&mut self, process_id: ProcessId) -> usize {
        let Some(table) = self.page_tables.remove(&process_id) else {
            return 0;
        };

        let mut released = 0;
        for page in table.resident_pages() {
            self.replacer.on_remove(page);
            if let Some(frame) = page.frame() {
                self.frames[frame].release();
                self.free_list.push_back(frame);
                released += 1;
            }
        }

        debug!(
            "freed {} pages of process {}, {} frames released",
            table.len(),
            process_id,
            released
        );
        released
    }

    /// Swaps the active strategy. Resident pages keep their frames; the new
    /// strategy adopts them in load order.
    pub fn set_replacement_strategy(&mut self, policy: Policy) {
        let mut strategy = ReplacementStrategy::new(policy, self.frames.len());

        let mut resident: Vec<&Page> = self
            .page_tables
            .values()
            .flat_map(PageTable::resident_pages)
            .collect();
        resident.sort_by_key(|page| (page.load_time(), page.page_number(), page.process_id()));
        for page in resident {
            strategy.track(page);
        }

        info!("replacement strategy: {} -> {}", self.replacer.policy(), policy);
        self.replacer = strategy;
    }

    pub fn get_memory_stats(&self) -> MemoryStats {
        let frames_free = self.frames.iter().filter(|frame| frame.is_free()).count();
        MemoryStats {
            page_faults: self.page_faults,
            hits: self.hits,
            total_accesses: self.page_faults + self.hits,
            fault_rate: ratio(self.page_faults, self.hits),
            hit_rate: ratio(self.hits, self.page_faults),
            evictions: self.evictions,
            write_backs: self.write_backs,
            frames_used: self.frames.len() - frames_free,
            frames_free,
            frames_total: self.frames.len(),
            policy: self.replacer.policy(),
        }
    }

    /// Translates without side effects: `Some` when resident, `None` when
    /// allocated but not loaded.
    pub fn translate(
        &self,
        process_id: ProcessId,
        virtual_address: VirtualAddress,
    ) -> Result<Option<u64>> {
        let page_size = self.config.page_size;
        let page = self
            .page_tables
            .get(&process_id)
            .and_then(|table| table.get(virtual_address / page_size))
            .ok_or(Error::UnmappedAddress {
                process_id,
                virtual_address,
            })?;
        Ok(page
            .frame()
            .map(|frame| frame as u64 * page_size + virtual_address % page_size))
    }

    pub fn page(&self, process_id: ProcessId, page_number: PageNumber) -> Option<Page> {
        self.page_tables
            .get(&process_id)
            .and_then(|table| table.get(page_number))
            .cloned()
    }

    pub fn memory_map(&self) -> Vec<FrameSnapshot> {
        self.frames
            .iter()
            .map(|frame| {
                let page = frame
                    .occupant()
                    .and_then(|key| self.page(key.process_id, key.page_number));
                FrameSnapshot {
                    frame: frame.index(),
                    occupant: frame.occupant(),
                    reference_bit: page.as_ref().is_some_and(Page::reference_bit),
                    dirty_bit: page.as_ref().is_some_and(Page::dirty_bit),
                }
            })
            .collect()
    }

    pub fn page_table_stats(&self, process_id: ProcessId) -> Option<PageTableStats> {
        self.page_tables.get(&process_id).map(PageTable::stats)
    }

    /// Process ids that currently own a page table, in ascending order.
    pub fn processes(&self) -> Vec<ProcessId> {
        let mut processes: Vec<ProcessId> = self.page_tables.keys().copied().collect();
        processes.sort_unstable();
        processes
    }

    /// Verifies frame accounting and the page/frame bijection.
    pub fn check_invariants(&self) -> Result<()> {
        let inconsistent = |msg: String| Err(Error::InconsistentState(msg));

        let mut resident = 0;
        for page in self.page_tables.values().flat_map(PageTable::pages) {
            let key = page.key();
            match (page.is_resident(), page.frame()) {
                (true, Some(frame)) => {
                    resident += 1;
                    match self.frames.get(frame) {
                        Some(slot) if slot.occupant() == Some(key) => {}
                        Some(slot) => {
                            return inconsistent(format!(
                                "{key} claims frame {frame} held by {:?}",
                                slot.occupant()
                            ))
                        }
                        None => return inconsistent(format!("{key} claims missing frame {frame}")),
                    }
                    if page.load_time() > page.last_access_time() {
                        return inconsistent(format!("{key} was accessed before it was loaded"));
                    }
                }
                (true, None) => return inconsistent(format!("resident page {key} has no frame")),
                (false, Some(frame)) => {
                    return inconsistent(format!("non-resident page {key} holds frame {frame}"))
                }
                (false, None) => {}
            }
        }

        let mut occupied = 0;
        for frame in &self.frames {
            let Some(key) = frame.occupant() else {
                continue;
            };
            occupied += 1;
            let owner = self.page(key.process_id, key.page_number);
            if owner.and_then(|page| page.frame()) != Some(frame.index()) {
                return inconsistent(format!(
                    "frame {} holds {key}, which does not map back to it",
                    frame.index()
                ));
            }
        }

        if resident != occupied || occupied > self.frames.len() {
            return inconsistent(format!(
                "{resident} resident pages but {occupied} of {} frames occupied",
                self.frames.len()
            ));
        }

        let free: HashSet<FrameId> = self.free_list.iter().copied().collect();
        if free.len() != self.free_list.len() {
            return inconsistent("free list holds duplicate frames".to_string());
        }
        if let Some(frame) = free.iter().find(|&&frame| !self.frames[frame].is_free()) {
            return inconsistent(format!("occupied frame {frame} is on the free list"));
        }
        if free.len() + occupied != self.frames.len() {
            return inconsistent(format!(
                "{} free and {occupied} occupied frames out of {}",
                free.len(),
                self.frames.len()
            ));
        }

        Ok(())
    }

    fn tick(&mut self) -> Tick {
        self.clock += 1;
        self.clock
    }

    fn lookup_mut(
        page_tables: &mut HashMap<ProcessId, PageTable>,
        key: PageKey,
    ) -> Result<&mut Page> {
        page_tables
            .get_mut(&key.process_id)
            .and_then(|table| table.get_mut(key.page_number))
            .ok_or_else(|| Error::InconsistentState(format!("page {key} vanished mid-access")))
    }
}
