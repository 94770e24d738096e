use serde::{Deserialize, Serialize};

use crate::config::Policy;
use crate::page::PageKey;
use crate::typedef::{FrameId, ProcessId};

/// Snapshot of the manager's counters. Counters only reset when a new
/// manager is constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub page_faults: u64,
    pub hits: u64,
    pub total_accesses: u64,
    pub fault_rate: f64,
    pub hit_rate: f64,
    pub evictions: u64,
    pub write_backs: u64,
    pub frames_used: usize,
    pub frames_free: usize,
    pub frames_total: usize,
    pub policy: Policy,
}

/// One row of the memory map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: FrameId,
    pub occupant: Option<PageKey>,
    pub reference_bit: bool,
    pub dirty_bit: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTableStats {
    pub process_id: ProcessId,
    pub total_entries: usize,
    pub resident_entries: usize,
    pub referenced_entries: usize,
    pub dirty_entries: usize,
}

/// Returns `part / (part + rest)`, or 0 when both are zero.
pub(crate) fn ratio(part: u64, rest: u64) -> f64 {
    let total = part + rest;
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(3, 1), 0.75);
        assert_eq!(ratio(0, 5), 0.0);
    }
}
