use pagesim_error::errstrategy;

use super::replacer::{Replacer, ResidentSet};
use crate::page::{Page, PageKey};
use crate::typedef::FrameId;
use crate::Result;

/// Second-chance replacement. The ring is the frame pool in frame order;
/// free slots are skipped by the sweep.
#[derive(Debug)]
pub(crate) struct ClockReplacer {
    hand: FrameId,
    frame_count: usize,
}

impl ClockReplacer {
    pub(crate) fn new(frame_count: usize) -> Self {
        Self {
            hand: 0,
            frame_count,
        }
    }

    #[cfg(test)]
    fn hand(&self) -> FrameId {
        self.hand
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.frame_count.max(1);
    }
}

impl Replacer for ClockReplacer {
    /// A page loaded into the slot under the hand pushes the hand past it.
    /// After a sweep the hand already sits past the freed slot.
    fn on_load(&mut self, page: &Page) {
        if page.frame() == Some(self.hand) {
            self.advance();
        }
    }

    // The manager sets the reference bit on hits.
    fn on_access(&mut self, _page: &Page) {}

    fn on_remove(&mut self, _page: &Page) {}

    fn track(&mut self, _page: &Page) {}

    fn select_victim(&mut self, resident: &mut ResidentSet<'_>) -> Result<PageKey> {
        if resident.is_empty() {
            return errstrategy!("clock asked for a victim with no resident pages");
        }

        // Each clear pass leaves at least one bit unset, so two revolutions
        // always find a victim.
        for _ in 0..2 * self.frame_count {
            let Some(key) = resident.occupant(self.hand) else {
                self.advance();
                continue;
            };
            let Some(page) = resident.page_mut(key) else {
                return errstrategy!(
                    "frame {} names {} but that page is not resident",
                    self.hand,
                    key
                );
            };

            if page.reference_bit {
                page.reference_bit = false;
                self.advance();
            } else {
                self.advance();
                return Ok(key);
            }
        }

        errstrategy!(
            "clock sweep found no victim in two revolutions over {} frames",
            resident.frame_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacer::replacer::test_support::Fixture;
    use crate::Error;

    fn loaded(frames: usize) -> (Fixture, ClockReplacer) {
        let mut fixture = Fixture::new(frames);
        let mut clock = ClockReplacer::new(frames);
        for frame in 0..frames {
            let page = fixture.load(frame as u64, frame);
            clock.on_load(&page);
        }
        (fixture, clock)
    }

    #[test]
    fn test_hand_follows_sequential_loads() {
        let (_, clock) = loaded(3);
        assert_eq!(clock.hand(), 0);

        let mut fixture = Fixture::new(3);
        let mut clock = ClockReplacer::new(3);
        let page = fixture.load(0, 0);
        clock.on_load(&page);
        assert_eq!(clock.hand(), 1);
    }

    #[test]
    fn test_second_chance() {
        let (mut fixture, mut clock) = loaded(3);

        let victim = clock.select_victim(&mut fixture.resident()).unwrap();

        assert_eq!(victim, PageKey::new(1, 0));
        assert!(!fixture.page(1).reference_bit());
        assert!(!fixture.page(2).reference_bit());
        assert_eq!(clock.hand(), 1);
    }

    #[test]
    fn test_unreferenced_page_under_hand_goes_first() {
        let (mut fixture, mut clock) = loaded(3);
        fixture
            .resident()
            .page_mut(PageKey::new(1, 1))
            .unwrap()
            .reference_bit = false;

        let victim = clock.select_victim(&mut fixture.resident()).unwrap();

        assert_eq!(victim, PageKey::new(1, 1));
        assert!(!fixture.page(0).reference_bit(), "swept past and cleared");
        assert!(fixture.page(2).reference_bit(), "never reached");
        assert_eq!(clock.hand(), 2);
    }

    #[test]
    fn test_free_slots_are_skipped() {
        let (mut fixture, mut clock) = loaded(3);
        fixture.evict(PageKey::new(1, 0));

        let victim = clock.select_victim(&mut fixture.resident()).unwrap();

        assert_eq!(victim, PageKey::new(1, 1));
    }

    #[test]
    fn test_empty_resident_set_is_an_error() {
        let mut fixture = Fixture::new(2);
        let mut clock = ClockReplacer::new(2);
        assert!(matches!(
            clock.select_victim(&mut fixture.resident()),
            Err(Error::StrategyInvariantViolation(_))
        ));
    }
}
