mod clock_replacer;
mod fifo_replacer;
mod lru_replacer;
#[allow(clippy::module_inception)]
pub(crate) mod replacer;

use clock_replacer::ClockReplacer;
use fifo_replacer::FifoReplacer;
use lru_replacer::LruReplacer;
pub(crate) use replacer::{Replacer, ResidentSet};

use crate::config::Policy;
use crate::page::{Page, PageKey};
use crate::Result;

/// The active replacement strategy. A closed set, so victim selection is
/// checked exhaustively.
#[derive(Debug)]
pub(crate) enum ReplacementStrategy {
    Fifo(FifoReplacer),
    Lru(LruReplacer),
    Clock(ClockReplacer),
}

impl ReplacementStrategy {
    pub(crate) fn new(policy: Policy, frame_count: usize) -> Self {
        match policy {
            Policy::Fifo => Self::Fifo(FifoReplacer::new()),
            Policy::Lru => Self::Lru(LruReplacer::new()),
            Policy::Clock => Self::Clock(ClockReplacer::new(frame_count)),
        }
    }

    pub(crate) fn policy(&self) -> Policy {
        match self {
            Self::Fifo(_) => Policy::Fifo,
            Self::Lru(_) => Policy::Lru,
            Self::Clock(_) => Policy::Clock,
        }
    }

    fn inner(&mut self) -> &mut dyn Replacer {
        match self {
            Self::Fifo(fifo) => fifo,
            Self::Lru(lru) => lru,
            Self::Clock(clock) => clock,
        }
    }
}

impl Replacer for ReplacementStrategy {
    fn on_load(&mut self, page: &Page) {
        self.inner().on_load(page)
    }

    fn on_access(&mut self, page: &Page) {
        self.inner().on_access(page)
    }

    fn on_remove(&mut self, page: &Page) {
        self.inner().on_remove(page)
    }

    fn track(&mut self, page: &Page) {
        self.inner().track(page)
    }

    fn select_victim(&mut self, resident: &mut ResidentSet<'_>) -> Result<PageKey> {
        self.inner().select_victim(resident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_maps_policy() {
        for policy in Policy::ALL {
            assert_eq!(ReplacementStrategy::new(policy, 4).policy(), policy);
        }
    }
}
