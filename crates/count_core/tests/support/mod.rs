#![allow(dead_code)]

use count_core::test_helpers::InMemoryStore;
use count_core::{CountReport, ScanCoordinator, ScanPlan, SilentProgress};

/// Runs a silent count of `store` and panics on any fatal error.
pub fn count_silently(store: &InMemoryStore, segments: u32, limit: u32) -> CountReport {
    let plan = ScanPlan::new(segments, limit).expect("plan should pass");
    ScanCoordinator::new(store, plan, &SilentProgress)
        .run()
        .expect("count should pass")
}

/// Upper bound on pages needed to exhaust a segment of `items` items.
pub fn page_bound(items: u64, limit: u32) -> u64 {
    items.div_ceil(u64::from(limit)).max(1)
}
