use std::collections::VecDeque;

use pagesim_error::errstrategy;

use super::replacer::{Replacer, ResidentSet};
use crate::page::{Page, PageKey};
use crate::Result;

/// Evicts the earliest-loaded resident page, regardless of later hits.
#[derive(Debug, Default)]
pub(crate) struct FifoReplacer {
    queue: VecDeque<PageKey>,
}

impl FifoReplacer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.queue.len()
    }
}

impl Replacer for FifoReplacer {
    fn on_load(&mut self, page: &Page) {
        self.queue.push_back(page.key());
    }

    fn on_access(&mut self, _page: &Page) {}

    fn on_remove(&mut self, page: &Page) {
        let key = page.key();
        self.queue.retain(|queued| *queued != key);
    }

    fn track(&mut self, page: &Page) {
        self.queue.push_back(page.key());
    }

    fn select_victim(&mut self, resident: &mut ResidentSet<'_>) -> Result<PageKey> {
        if resident.is_empty() {
            return errstrategy!("fifo asked for a victim with no resident pages");
        }
        while let Some(key) = self.queue.pop_front() {
            if resident.contains(key) {
                return Ok(key);
            }
        }
        errstrategy!(
            "fifo queue exhausted with {} pages still resident",
            resident.len()
        )
    }
}
