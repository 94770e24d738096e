use std::collections::HashMap;

use crate::frame::Frame;
use crate::page::{Page, PageKey, PageTable};
use crate::typedef::{FrameId, ProcessId};
use crate::Result;

/// Capability set shared by every replacement policy.
pub(crate) trait Replacer {
    /// Called exactly once each time a page becomes resident.
    fn on_load(&mut self, page: &Page);

    /// Called on every hit. Never called for the access that faulted the page in.
    fn on_access(&mut self, page: &Page);

    /// Forgets a resident page that is leaving memory without being chosen
    /// as a victim (its process freed its pages).
    fn on_remove(&mut self, page: &Page);

    /// Adopts a page that was already resident when this strategy became
    /// active. Called in load order.
    fn track(&mut self, page: &Page);

    /// Chooses a resident page to evict. Must return a member of `resident`.
    fn select_victim(&mut self, resident: &mut ResidentSet<'_>) -> Result<PageKey>;
}

/// The manager's view of resident pages handed to a strategy during
/// victim selection. Reference bits may be cleared through it; nothing else
/// about the mapping can be changed.
pub(crate) struct ResidentSet<'a> {
    frames: &'a [Frame],
    page_tables: &'a mut HashMap<ProcessId, PageTable>,
}

impl<'a> ResidentSet<'a> {
    pub(crate) fn new(
        frames: &'a [Frame],
        page_tables: &'a mut HashMap<ProcessId, PageTable>,
    ) -> Self {
        Self {
            frames,
            page_tables,
        }
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of occupied frames.
    pub(crate) fn len(&self) -> usize {
        self.frames.iter().filter(|frame| !frame.is_free()).count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.iter().all(Frame::is_free)
    }

    pub(crate) fn occupant(&self, frame: FrameId) -> Option<PageKey> {
        self.frames.get(frame).and_then(Frame::occupant)
    }

    pub(crate) fn contains(&self, key: PageKey) -> bool {
        self.page(key).is_some()
    }

    pub(crate) fn page(&self, key: PageKey) -> Option<&Page> {
        self.page_tables
            .get(&key.process_id)?
            .get(key.page_number)
            .filter(|page| page.is_resident())
    }

    pub(crate) fn page_mut(&mut self, key: PageKey) -> Option<&mut Page> {
        self.page_tables
            .get_mut(&key.process_id)?
            .get_mut(key.page_number)
            .filter(|page| page.is_resident())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::typedef::{PageNumber, Tick};

    /// A hand-built frame pool and page tables for driving a replacer
    /// without a manager.
    pub(crate) struct Fixture {
        pub(crate) frames: Vec<Frame>,
        pub(crate) tables: HashMap<ProcessId, PageTable>,
        now: Tick,
    }

    impl Fixture {
        pub(crate) fn new(frame_count: usize) -> Self {
            Self {
                frames: (0..frame_count).map(Frame::new).collect(),
                tables: HashMap::new(),
                now: 0,
            }
        }

        /// Loads `page_number` of process 1 into `frame` and returns a copy.
        pub(crate) fn load(&mut self, page_number: PageNumber, frame: FrameId) -> Page {
            self.now += 1;
            let table = self.tables.entry(1).or_insert_with(|| PageTable::new(1));
            while table.get(page_number).is_none() {
                table.allocate(1, PageNumber::MAX).unwrap();
            }
            let page = table.get_mut(page_number).unwrap();
            page.load(frame, self.now, false);
            self.frames[frame].occupy(page.key());
            page.clone()
        }

        pub(crate) fn touch(&mut self, page_number: PageNumber) -> Page {
            self.now += 1;
            let page = self
                .tables
                .get_mut(&1)
                .and_then(|table| table.get_mut(page_number))
                .unwrap();
            page.touch(self.now, false);
            page.clone()
        }

        /// Evicts the page and frees its frame.
        pub(crate) fn evict(&mut self, key: PageKey) -> FrameId {
            let page = self
                .tables
                .get_mut(&key.process_id)
                .and_then(|table| table.get_mut(key.page_number))
                .unwrap();
            let (frame, _) = page.evict().unwrap();
            self.frames[frame].release();
            frame
        }

        pub(crate) fn page(&self, page_number: PageNumber) -> &Page {
            self.tables.get(&1).and_then(|t| t.get(page_number)).unwrap()
        }

        pub(crate) fn resident(&mut self) -> ResidentSet<'_> {
            ResidentSet::new(&self.frames, &mut self.tables)
        }
    }
}
