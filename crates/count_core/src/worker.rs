use tracing::{debug, warn};

use crate::aggregator::Aggregator;
use crate::contract::{PageStatus, SegmentOutcome, SegmentReport};
use crate::fetcher::PageFetcher;
use crate::plan::ScanPlan;
use crate::store::{CancelFlag, CountStore};

/// Per-segment pagination state. Never shared between workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentState<T> {
    pub segment_index: u32,
    pub cumulative_count: u64,
    pub current_token: Option<T>,
    pub pages_fetched: u64,
    pub done: bool,
}

impl<T> SegmentState<T> {
    pub fn new(segment_index: u32) -> Self {
        Self {
            segment_index,
            cumulative_count: 0,
            current_token: None,
            pages_fetched: 0,
            done: false,
        }
    }
}

/// Drives one segment from its first page until the store reports exhaustion,
/// a page fails, or the run is cancelled.
///
/// Every page's count is pushed to the aggregator as an increment right after
/// it arrives. A failed page stops the loop without retrying; whatever was
/// counted before it stays in the total.
pub struct SegmentWorker<'a, 'p, S: CountStore> {
    fetcher: PageFetcher<'a, S>,
    aggregator: &'a Aggregator<'p>,
    cancel: &'a CancelFlag,
    state: SegmentState<S::Token>,
}

impl<'a, 'p, S: CountStore> SegmentWorker<'a, 'p, S> {
    pub fn new(
        store: &'a S,
        plan: ScanPlan,
        segment_index: u32,
        aggregator: &'a Aggregator<'p>,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            fetcher: PageFetcher::new(store, plan, segment_index),
            aggregator,
            cancel,
            state: SegmentState::new(segment_index),
        }
    }

    pub fn run(mut self) -> SegmentReport {
        debug!(segment = self.state.segment_index, "segment scan started");

        loop {
            if self.cancel.is_cancelled() {
                let resume_token = self.resume_token();
                return self.finish(SegmentOutcome::Cancelled { resume_token });
            }

            let page = self.fetcher.fetch(self.state.current_token.clone());
            self.state.pages_fetched += 1;
            self.state.cumulative_count += page.item_count;
            self.aggregator.record_increment(page.item_count);

            match page.status {
                // A store that aborts an in-flight call on cancellation reports
                // it as a failed page.
                PageStatus::Failure if self.cancel.is_cancelled() => {
                    let resume_token = self.resume_token();
                    return self.finish(SegmentOutcome::Cancelled { resume_token });
                }
                PageStatus::Failure => {
                    let diagnostic = page.raw_diagnostic.unwrap_or_default();
                    warn!(
                        segment = self.state.segment_index,
                        page = self.state.pages_fetched,
                        counted = self.state.cumulative_count,
                        %diagnostic,
                        "scan page failed; keeping partial segment count"
                    );
                    let resume_token = self.resume_token();
                    return self.finish(SegmentOutcome::Failed {
                        diagnostic,
                        resume_token,
                    });
                }
                PageStatus::Success => match page.continuation_token {
                    Some(token) => self.state.current_token = Some(token),
                    None => return self.finish(SegmentOutcome::Exhausted),
                },
            }
        }
    }

    fn resume_token(&self) -> Option<String> {
        self.state
            .current_token
            .as_ref()
            .map(|token| self.fetcher.encode_token(token))
    }

    fn finish(mut self, outcome: SegmentOutcome) -> SegmentReport {
        self.state.done = true;
        debug!(
            segment = self.state.segment_index,
            pages = self.state.pages_fetched,
            count = self.state.cumulative_count,
            ?outcome,
            "segment scan finished"
        );
        SegmentReport {
            segment_index: self.state.segment_index,
            cumulative_count: self.state.cumulative_count,
            pages_fetched: self.state.pages_fetched,
            outcome,
        }
    }
}
