//! Offline comparison of replacement policies.
//!
//! Every replay builds its own [`VirtualMemoryManager`], so runs share no
//! state and can be evaluated in parallel.

use std::collections::BTreeMap;

use pagesim_error::errinput;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{MemoryConfig, Policy, DEFAULT_PAGE_SIZE};
use crate::memory_manager::VirtualMemoryManager;
use crate::typedef::{PageNumber, ProcessId, VirtualAddress};
use crate::Result;

/// One entry of an access trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    pub process_id: ProcessId,
    pub virtual_address: VirtualAddress,
    pub is_write: bool,
}

impl Access {
    pub fn read(process_id: ProcessId, virtual_address: VirtualAddress) -> Self {
        Self {
            process_id,
            virtual_address,
            is_write: false,
        }
    }

    pub fn write(process_id: ProcessId, virtual_address: VirtualAddress) -> Self {
        Self {
            process_id,
            virtual_address,
            is_write: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub policy: Policy,
    pub frame_count: usize,
    pub total_accesses: u64,
    pub page_faults: u64,
    pub hits: u64,
    pub fault_rate: f64,
    pub hit_rate: f64,
    pub evictions: u64,
    pub write_backs: u64,
}

/// Turns a page reference string into read accesses at the start of each
/// page, using the default page size. Pages past the end of the address
/// space are rejected.
pub fn reference_trace(process_id: ProcessId, pages: &[PageNumber]) -> Result<Vec<Access>> {
    pages
        .iter()
        .map(|&page| match page.checked_mul(DEFAULT_PAGE_SIZE) {
            Some(address) => Ok(Access::read(process_id, address)),
            None => errinput!("page {page} lies beyond the virtual address space"),
        })
        .collect()
}

/// Replays `trace` under one policy with `frame_count` frames.
pub fn analyze_algorithm(
    policy: Policy,
    trace: &[Access],
    frame_count: usize,
) -> Result<PolicyReport> {
    let config = MemoryConfig::with_frames(frame_count, DEFAULT_PAGE_SIZE, policy);
    let mut vmm = VirtualMemoryManager::new(config)?;
    allocate_for_trace(&mut vmm, trace)?;

    for access in trace {
        vmm.access_memory(access.process_id, access.virtual_address, access.is_write)?;
    }

    let stats = vmm.get_memory_stats();
    Ok(PolicyReport {
        policy,
        frame_count,
        total_accesses: stats.total_accesses,
        page_faults: stats.page_faults,
        hits: stats.hits,
        fault_rate: stats.fault_rate,
        hit_rate: stats.hit_rate,
        evictions: stats.evictions,
        write_backs: stats.write_backs,
    })
}

/// Replays the same trace independently under each policy, one policy per
/// worker. Reports come back in the order of `policies`.
pub fn compare_algorithms(
    trace: &[Access],
    frame_count: usize,
    policies: &[Policy],
) -> Result<Vec<PolicyReport>> {
    policies
        .par_iter()
        .map(|&policy| analyze_algorithm(policy, trace, frame_count))
        .collect()
}

/// Fault count of `policy` for each frame count, in the given order. A
/// count that rises with more frames is Belady's anomaly.
pub fn fault_curve(
    trace: &[Access],
    policy: Policy,
    frame_counts: impl IntoIterator<Item = usize>,
) -> Result<Vec<(usize, u64)>> {
    let frame_counts: Vec<usize> = frame_counts.into_iter().collect();
    frame_counts
        .par_iter()
        .map(|&frames| {
            analyze_algorithm(policy, trace, frames).map(|report| (frames, report.page_faults))
        })
        .collect()
}

/// Gives every process in the trace enough pages to cover its highest
/// referenced page.
fn allocate_for_trace(vmm: &mut VirtualMemoryManager, trace: &[Access]) -> Result<()> {
    let page_size = vmm.page_size();
    let mut highest: BTreeMap<ProcessId, PageNumber> = BTreeMap::new();
    for access in trace {
        let page = access.virtual_address / page_size;
        let entry = highest.entry(access.process_id).or_insert(page);
        *entry = (*entry).max(page);
    }
    for (process_id, page) in highest {
        vmm.allocate_pages(process_id, page + 1)?;
    }
    Ok(())
}
