use std::sync::{Mutex, PoisonError};

use crate::progress::ProgressReporter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateState {
    pub total_count: u64,
    /// Approximate pre-scan size. Bounds the displayed value only.
    pub estimated_total: Option<u64>,
}

impl AggregateState {
    /// Value shown on the progress display. The real total may pass the
    /// estimate when the table grows during the scan.
    pub fn display_value(&self) -> u64 {
        match self.estimated_total {
            Some(estimate) => self.total_count.min(estimate),
            None => self.total_count,
        }
    }
}

/// Serialized accumulator shared by every segment worker.
pub struct Aggregator<'p> {
    state: Mutex<AggregateState>,
    progress: &'p dyn ProgressReporter,
}

impl<'p> Aggregator<'p> {
    /// Creates the accumulator and starts the progress display.
    pub fn start(estimated_total: Option<u64>, progress: &'p dyn ProgressReporter) -> Self {
        progress.start(estimated_total);
        Self {
            state: Mutex::new(AggregateState {
                total_count: 0,
                estimated_total,
            }),
            progress,
        }
    }

    /// Adds `count` to the running total and pushes the clamped value to the
    /// progress display. The update happens under the same lock as the add, so
    /// displayed values never go backwards.
    pub fn record_increment(&self, count: u64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.total_count = state.total_count.saturating_add(count);
        self.progress.update(state.display_value());
    }

    pub fn total(&self) -> u64 {
        self.snapshot().total_count
    }

    pub fn snapshot(&self) -> AggregateState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Closes the progress display and returns the final total.
    pub fn finish(self) -> u64 {
        self.progress.finish();
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .total_count
    }
}

impl std::fmt::Debug for Aggregator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}
