//! Segmented scan orchestration.
//!
//! The coordinator waits for the table, sizes the progress display from the
//! store's approximate item count, then runs one [`SegmentWorker`] per segment
//! on a rayon pool with exactly `total_segments` threads. The pool's `install`
//! call is the single join point: it returns once every worker has exhausted
//! its segment, failed, or been cancelled.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::contract::{CountReport, SegmentReport};
use crate::error::CountError;
use crate::plan::ScanPlan;
use crate::progress::ProgressReporter;
use crate::store::{CancelFlag, CountStore};
use crate::worker::SegmentWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorPhase {
    Idle,
    Running,
    Draining,
    Done,
}

pub struct ScanCoordinator<'a, S: CountStore> {
    store: &'a S,
    plan: ScanPlan,
    progress: &'a dyn ProgressReporter,
    cancel: CancelFlag,
    phase: CoordinatorPhase,
}

impl<'a, S: CountStore> ScanCoordinator<'a, S> {
    pub fn new(store: &'a S, plan: ScanPlan, progress: &'a dyn ProgressReporter) -> Self {
        Self {
            store,
            plan,
            progress,
            cancel: CancelFlag::default(),
            phase: CoordinatorPhase::Idle,
        }
    }

    /// Uses an externally owned flag so callers (e.g. a Ctrl-C handler) can
    /// stop the scan.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Runs the count once. A second call returns [`CountError::AlreadyRun`].
    pub fn run(&mut self) -> Result<CountReport, CountError> {
        if self.phase != CoordinatorPhase::Idle {
            return Err(CountError::AlreadyRun);
        }
        // One-shot: even a failed start leaves the coordinator spent.
        self.phase = CoordinatorPhase::Done;

        let started = Instant::now();
        let table = self.store.table_name().to_string();

        info!(table = %table, "waiting for table to become ready");
        self.store
            .wait_until_ready()
            .map_err(|diagnostic| CountError::TableNotReady {
                table: table.clone(),
                diagnostic,
            })?;

        let estimated_total = match self.store.approximate_item_count() {
            Ok(estimate) => Some(estimate),
            Err(diagnostic) => {
                warn!(table = %table, %diagnostic, "approximate item count unavailable");
                None
            }
        };

        let segment_count = self.plan.total_segments();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(segment_count as usize)
            .thread_name(|index| format!("scan-segment-{index}"))
            .build()?;

        let aggregator = Aggregator::start(estimated_total, self.progress);
        self.phase = CoordinatorPhase::Running;
        info!(
            table = %table,
            segments = segment_count,
            page_size_limit = self.plan.page_size_limit(),
            estimated_total,
            "dispatching segment workers"
        );

        let store = self.store;
        let plan = self.plan;
        let cancel = &self.cancel;
        let aggregator_ref = &aggregator;
        let segments: Vec<SegmentReport> = pool.install(|| {
            plan.segment_indexes()
                .into_par_iter()
                .with_max_len(1)
                .map(|segment_index| {
                    SegmentWorker::new(store, plan, segment_index, aggregator_ref, cancel).run()
                })
                .collect()
        });

        self.phase = CoordinatorPhase::Draining;
        debug!(table = %table, "all segment workers joined");

        let total_count = aggregator.finish();
        let report = CountReport {
            table_name: table,
            total_count,
            estimated_total,
            total_segments: segment_count,
            page_size_limit: self.plan.page_size_limit(),
            segments,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        debug_assert_eq!(report.segment_sum(), report.total_count);

        for segment in report.incomplete_segments() {
            warn!(
                table = %report.table_name,
                segment = segment.segment_index,
                counted = segment.cumulative_count,
                outcome = ?segment.outcome,
                "segment stopped before exhaustion"
            );
        }
        info!(
            table = %report.table_name,
            total_count = report.total_count,
            elapsed_ms = report.elapsed_ms,
            "count finished"
        );

        self.phase = CoordinatorPhase::Done;
        Ok(report)
    }
}

/// Validates the segmentation and runs a single count against `store`.
pub fn count_table<S: CountStore>(
    store: &S,
    total_segments: u32,
    page_size_limit: u32,
    progress: &dyn ProgressReporter,
) -> Result<CountReport, CountError> {
    let plan = ScanPlan::new(total_segments, page_size_limit)?;
    ScanCoordinator::new(store, plan, progress).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::SegmentOutcome;
    use crate::progress::SilentProgress;
    use crate::test_helpers::{InMemoryStore, RecordingProgress};

    #[test]
    fn total_matches_sum_of_segments() {
        let store = InMemoryStore::new("orders", 1_234);
        let report = count_table(&store, 8, 50, &SilentProgress).expect("count should pass");

        assert_eq!(report.total_count, 1_234);
        assert_eq!(report.segment_sum(), 1_234);
        assert_eq!(report.segments.len(), 8);
        assert!(report.is_complete());
        let indexes: Vec<u32> = report.segments.iter().map(|s| s.segment_index).collect();
        assert_eq!(indexes, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn readiness_failure_is_fatal_before_any_scan() {
        let store = InMemoryStore::new("orders", 10).not_ready("ResourceNotFoundException");
        let progress = RecordingProgress::default();
        let plan = ScanPlan::new(2, 5).expect("plan should pass");
        let mut coordinator = ScanCoordinator::new(&store, plan, &progress);

        let error = coordinator.run().expect_err("run should fail");

        assert!(matches!(
            error,
            CountError::TableNotReady { ref table, ref diagnostic }
                if table == "orders" && diagnostic == "ResourceNotFoundException"
        ));
        assert!(store.calls().is_empty());
        assert_eq!(progress.expected_total(), None);
        assert_eq!(coordinator.phase(), CoordinatorPhase::Done);
    }

    #[test]
    fn invalid_configuration_is_rejected_before_scanning() {
        let store = InMemoryStore::new("orders", 10);
        let error = count_table(&store, 0, 500, &SilentProgress).expect_err("count should fail");

        assert!(matches!(error, CountError::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn missing_estimate_does_not_stop_the_count() {
        let store = InMemoryStore::new("orders", 77).with_estimate(Err("no item count".to_string()));
        let progress = RecordingProgress::default();

        let report = count_table(&store, 3, 10, &progress).expect("count should pass");

        assert_eq!(report.total_count, 77);
        assert_eq!(report.estimated_total, None);
        assert_eq!(progress.expected_total(), Some(None));
        assert_eq!(progress.updates().last().copied(), Some(77));
        assert!(progress.is_finished());
    }

    #[test]
    fn coordinator_is_one_shot() {
        let store = InMemoryStore::new("orders", 5);
        let plan = ScanPlan::new(1, 5).expect("plan should pass");
        let mut coordinator = ScanCoordinator::new(&store, plan, &SilentProgress);
        assert_eq!(coordinator.phase(), CoordinatorPhase::Idle);

        coordinator.run().expect("first run should pass");
        assert_eq!(coordinator.phase(), CoordinatorPhase::Done);

        let error = coordinator.run().expect_err("second run should fail");
        assert!(matches!(error, CountError::AlreadyRun));
    }

    #[test]
    fn cancellation_keeps_partial_counts() {
        let cancel = CancelFlag::default();
        let store = InMemoryStore::new("orders", 1_000).cancel_after(3, cancel.clone());
        let plan = ScanPlan::new(1, 10).expect("plan should pass");
        let mut coordinator =
            ScanCoordinator::new(&store, plan, &SilentProgress).with_cancel_flag(cancel);

        let report = coordinator.run().expect("run should pass");

        assert_eq!(report.total_count, 30);
        assert_eq!(
            report.segments[0].outcome,
            SegmentOutcome::Cancelled {
                resume_token: Some("30".to_string())
            }
        );
    }
}
