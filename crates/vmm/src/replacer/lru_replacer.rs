use std::collections::{BTreeSet, HashMap};

use pagesim_error::errstrategy;

use super::replacer::{Replacer, ResidentSet};
use crate::page::{Page, PageKey};
use crate::typedef::{PageNumber, ProcessId, Tick};
use crate::Result;

/// Ordering key for the recency index. Sorts by last access, then by
/// virtual page number, then by process, so the least recently used page
/// with the smallest page number comes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Recency {
    last_access_time: Tick,
    page_number: PageNumber,
    process_id: ProcessId,
}

impl Recency {
    fn of(page: &Page) -> Self {
        Self {
            last_access_time: page.last_access_time(),
            page_number: page.page_number(),
            process_id: page.process_id(),
        }
    }

    fn key(&self) -> PageKey {
        PageKey::new(self.process_id, self.page_number)
    }
}

/// Evicts the resident page with the smallest last access time.
#[derive(Debug, Default)]
pub(crate) struct LruReplacer {
    recency: BTreeSet<Recency>,
    node_store: HashMap<PageKey, Recency>,
}

impl LruReplacer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts or moves the page to its current recency position.
    fn record_access(&mut self, page: &Page) {
        let entry = Recency::of(page);
        if let Some(previous) = self.node_store.insert(page.key(), entry) {
            self.recency.remove(&previous);
        }
        self.recency.insert(entry);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.node_store.len()
    }
}

impl Replacer for LruReplacer {
    fn on_load(&mut self, page: &Page) {
        self.record_access(page);
    }

    fn on_access(&mut self, page: &Page) {
        self.record_access(page);
    }

    fn on_remove(&mut self, page: &Page) {
        if let Some(entry) = self.node_store.remove(&page.key()) {
            self.recency.remove(&entry);
        }
    }

    fn track(&mut self, page: &Page) {
        self.record_access(page);
    }

    fn select_victim(&mut self, resident: &mut ResidentSet<'_>) -> Result<PageKey> {
        if resident.is_empty() {
            return errstrategy!("lru asked for a victim with no resident pages");
        }
        while let Some(entry) = self.recency.pop_first() {
            let key = entry.key();
            self.node_store.remove(&key);
            if resident.contains(key) {
                return Ok(key);
            }
        }
        errstrategy!(
            "lru index exhausted with {} pages still resident",
            resident.len()
        )
    }
}
