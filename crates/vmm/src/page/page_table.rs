use std::collections::BTreeMap;
use std::ops::Range;

use pagesim_error::erralloc;

use super::page::Page;
use crate::stats::PageTableStats;
use crate::typedef::{PageNumber, ProcessId};
use crate::Result;

/// Per-process mapping from virtual page number to page metadata.
#[derive(Debug)]
pub(crate) struct PageTable {
    process_id: ProcessId,
    entries: BTreeMap<PageNumber, Page>,
    next_page_number: PageNumber,
}

impl PageTable {
    pub(crate) fn new(process_id: ProcessId) -> Self {
        Self {
            process_id,
            entries: BTreeMap::new(),
            next_page_number: 0,
        }
    }

    /// Appends `num_pages` unallocated pages after the highest page number,
    /// never exceeding `page_limit` pages in total. All or nothing: on error
    /// the table is unchanged.
    pub(crate) fn allocate(
        &mut self,
        num_pages: u64,
        page_limit: PageNumber,
    ) -> Result<Range<PageNumber>> {
        let start = self.next_page_number;
        let end = match start.checked_add(num_pages) {
            Some(end) if end <= page_limit => end,
            _ => {
                return erralloc!(
                    "{} pages overflow the address space of process {}",
                    num_pages,
                    self.process_id
                )
            }
        };

        for page_number in start..end {
            self.entries
                .insert(page_number, Page::new(self.process_id, page_number));
        }
        self.next_page_number = end;

        Ok(start..end)
    }

    pub(crate) fn get(&self, page_number: PageNumber) -> Option<&Page> {
        self.entries.get(&page_number)
    }

    pub(crate) fn get_mut(&mut self, page_number: PageNumber) -> Option<&mut Page> {
        self.entries.get_mut(&page_number)
    }

    pub(crate) fn pages(&self) -> impl Iterator<Item = &Page> {
        self.entries.values()
    }

    pub(crate) fn resident_pages(&self) -> impl Iterator<Item = &Page> {
        self.entries.values().filter(|page| page.is_resident())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn stats(&self) -> PageTableStats {
        let mut stats = PageTableStats {
            process_id: self.process_id,
            total_entries: self.entries.len(),
            ..Default::default()
        };
        for page in self.resident_pages() {
            stats.resident_entries += 1;
            if page.reference_bit() {
                stats.referenced_entries += 1;
            }
            if page.dirty_bit() {
                stats.dirty_entries += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageState;
    use crate::Error;

    #[test]
    fn test_allocate_is_contiguous() {
        let mut table = PageTable::new(1);
        assert_eq!(table.allocate(3, u64::MAX).unwrap(), 0..3);
        assert_eq!(table.allocate(2, u64::MAX).unwrap(), 3..5);
        assert_eq!(table.len(), 5);
        assert!(table
            .pages()
            .all(|page| page.state() == PageState::Unallocated));
    }

    #[test]
    fn test_allocate_overflow_leaves_table_unchanged() {
        let mut table = PageTable::new(1);
        table.allocate(2, 4).unwrap();
        assert!(matches!(
            table.allocate(u64::MAX, u64::MAX),
            Err(Error::InvalidAllocation(_))
        ));
        assert!(matches!(table.allocate(3, 4), Err(Error::InvalidAllocation(_))));
        assert_eq!(table.len(), 2);
        assert_eq!(table.allocate(2, 4).unwrap(), 2..4);
    }

    #[test]
    fn test_stats() {
        let mut table = PageTable::new(4);
        table.allocate(3, u64::MAX).unwrap();
        table.get_mut(0).unwrap().load(0, 1, true);
        table.get_mut(2).unwrap().load(1, 2, false);
        table.get_mut(2).unwrap().reference_bit = false;

        let stats = table.stats();
        assert_eq!(stats.process_id, 4);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.resident_entries, 2);
        assert_eq!(stats.referenced_entries, 1);
        assert_eq!(stats.dirty_entries, 1);
    }
}
