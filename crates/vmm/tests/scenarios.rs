use vmm::{
    compare_algorithms, reference_trace, Error, MemoryConfig, PageState, Policy,
    VirtualMemoryManager,
};

const PAGE: u64 = 4096;

fn replay(policy: Policy, frames: usize, pages: &[u64]) -> VirtualMemoryManager {
    let mut vmm =
        VirtualMemoryManager::new(MemoryConfig::with_frames(frames, PAGE, policy)).unwrap();
    let highest = pages.iter().copied().max().unwrap_or(0);
    vmm.allocate_pages(1, highest + 1).unwrap();
    for &page in pages {
        vmm.access_memory(1, page * PAGE, false).unwrap();
        vmm.check_invariants().unwrap();
    }
    vmm
}

#[test]
fn belady_anomaly_is_reproducible() {
    let pages = [1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5];
    let three = replay(Policy::Fifo, 3, &pages).get_memory_stats();
    let four = replay(Policy::Fifo, 4, &pages).get_memory_stats();

    assert_eq!(three.page_faults, 9);
    assert_eq!(four.page_faults, 10);
    assert!(four.page_faults > three.page_faults);
}

#[test]
fn lru_fault_rate_scenario() {
    // Hand-simulated: cold misses on 0..=3, hits on 2 and 1, then every
    // one of the last eight references misses.
    let pages = [0, 1, 2, 3, 2, 1, 4, 5, 6, 7, 8, 9, 0, 1];
    let stats = replay(Policy::Lru, 4, &pages).get_memory_stats();

    assert_eq!(stats.page_faults, 12);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.total_accesses, 14);
    assert_eq!(stats.frames_used, 4);
    assert!((stats.fault_rate - 12.0 / 14.0).abs() < 1e-12);
}

#[test]
fn analyzer_agrees_with_manual_replay() {
    let pages = [7, 0, 1, 2, 0, 3, 0, 4, 2, 3, 0, 3, 2];
    let trace = reference_trace(1, &pages).unwrap();
    let reports = compare_algorithms(&trace, 3, &Policy::ALL).unwrap();

    for report in reports {
        let stats = replay(report.policy, 3, &pages).get_memory_stats();
        assert_eq!(report.page_faults, stats.page_faults, "{}", report.policy);
        assert_eq!(report.hits, stats.hits, "{}", report.policy);
    }
}

#[test]
fn process_lifecycle() {
    let mut vmm =
        VirtualMemoryManager::new(MemoryConfig::with_frames(4, PAGE, Policy::Clock)).unwrap();
    vmm.allocate_pages(1, 3).unwrap();
    vmm.allocate_pages(2, 2).unwrap();

    for page in 0..3 {
        vmm.access_memory(1, page * PAGE, page == 1).unwrap();
    }
    for page in 0..2 {
        vmm.access_memory(2, page * PAGE, false).unwrap();
    }
    assert_eq!(vmm.get_memory_stats().evictions, 1);
    vmm.check_invariants().unwrap();

    vmm.free_pages(1);
    vmm.check_invariants().unwrap();
    assert!(vmm
        .memory_map()
        .iter()
        .filter_map(|frame| frame.occupant)
        .all(|key| key.process_id == 2));

    assert!(matches!(
        vmm.access_memory(1, 0, false),
        Err(Error::UnmappedAddress { .. })
    ));
    vmm.allocate_pages(1, 1).unwrap();
    assert_eq!(vmm.page(1, 0).unwrap().state(), PageState::Unallocated);
}

#[test]
fn stats_serialize_to_json() {
    let vmm = replay(Policy::Fifo, 2, &[0, 1, 0]);
    let json = serde_json::to_value(vmm.get_memory_stats()).unwrap();
    assert_eq!(json["page_faults"], 2);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["policy"], "fifo");
}
