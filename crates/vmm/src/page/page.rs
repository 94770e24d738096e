use std::fmt;

use serde::{Deserialize, Serialize};

use crate::typedef::{FrameId, PageNumber, ProcessId, Tick};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageState {
    /// Allocated in the virtual address space but never loaded.
    Unallocated,
    Resident,
    Evicted,
}

/// Identity of one virtual page across all processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageKey {
    pub process_id: ProcessId,
    pub page_number: PageNumber,
}

impl PageKey {
    pub fn new(process_id: ProcessId, page_number: PageNumber) -> Self {
        Self {
            process_id,
            page_number,
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.process_id, self.page_number)
    }
}

/// Metadata for one virtual page. The frame is stored as an index; the
/// manager owns both the frame pool and the page tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    process_id: ProcessId,
    page_number: PageNumber,
    state: PageState,
    frame: Option<FrameId>,
    load_time: Tick,
    last_access_time: Tick,
    pub(crate) reference_bit: bool,
    dirty_bit: bool,
}

impl Page {
    pub(crate) fn new(process_id: ProcessId, page_number: PageNumber) -> Self {
        Self {
            process_id,
            page_number,
            state: PageState::Unallocated,
            frame: None,
            load_time: 0,
            last_access_time: 0,
            reference_bit: false,
            dirty_bit: false,
        }
    }

    pub fn key(&self) -> PageKey {
        PageKey::new(self.process_id, self.page_number)
    }

    pub fn process_id(&self) -> ProcessId {
        self.process_id
    }

    pub fn page_number(&self) -> PageNumber {
        self.page_number
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// Frame holding the page; `None` unless resident.
    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    pub fn load_time(&self) -> Tick {
        self.load_time
    }

    pub fn last_access_time(&self) -> Tick {
        self.last_access_time
    }

    pub fn reference_bit(&self) -> bool {
        self.reference_bit
    }

    pub fn dirty_bit(&self) -> bool {
        self.dirty_bit
    }

    pub fn is_resident(&self) -> bool {
        self.state == PageState::Resident
    }

    /// Makes the page resident in `frame`.
    pub(crate) fn load(&mut self, frame: FrameId, now: Tick, is_write: bool) {
        self.state = PageState::Resident;
        self.frame = Some(frame);
        self.load_time = now;
        self.last_access_time = now;
        self.reference_bit = true;
        self.dirty_bit = is_write;
    }

    /// Records a hit on a resident page.
    pub(crate) fn touch(&mut self, now: Tick, is_write: bool) {
        debug_assert!(self.is_resident());
        self.last_access_time = now;
        self.reference_bit = true;
        self.dirty_bit |= is_write;
    }

    /// Moves the page out of its frame. Returns the frame and whether the
    /// page was dirty, i.e. whether a write-back is owed.
    pub(crate) fn evict(&mut self) -> Option<(FrameId, bool)> {
        let frame = self.frame.take()?;
        let dirty = self.dirty_bit;
        self.state = PageState::Evicted;
        self.reference_bit = false;
        self.dirty_bit = false;
        Some((frame, dirty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_is_unallocated() {
        let page = Page::new(1, 4);
        assert_eq!(page.state(), PageState::Unallocated);
        assert_eq!(page.frame(), None);
        assert_eq!(page.key(), PageKey::new(1, 4));
    }

    #[test]
    fn test_load_touch_evict() {
        let mut page = Page::new(1, 0);
        page.load(3, 10, false);
        assert!(page.is_resident());
        assert_eq!(page.frame(), Some(3));
        assert!(page.reference_bit());
        assert!(!page.dirty_bit());

        page.touch(12, true);
        assert_eq!(page.load_time(), 10);
        assert_eq!(page.last_access_time(), 12);
        assert!(page.dirty_bit());

        page.touch(13, false);
        assert!(page.dirty_bit(), "a read never clears the dirty bit");

        assert_eq!(page.evict(), Some((3, true)));
        assert_eq!(page.state(), PageState::Evicted);
        assert_eq!(page.frame(), None);
        assert!(!page.dirty_bit());
        assert_eq!(page.evict(), None);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(PageKey::new(2, 9).to_string(), "2:9");
    }
}
