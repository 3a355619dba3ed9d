//! In-memory store and progress recorder shared by unit tests, integration
//! tests and benchmarks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::contract::{ScanPage, ScanRequest};
use crate::progress::ProgressReporter;
use crate::store::{CancelFlag, CountStore};

/// A static table of `item_count` items keyed `0..item_count`.
///
/// Segment `i` of `n` owns the keys where `key % n == i`, so every
/// segmentation partitions the same dataset without overlap. The continuation
/// token is the offset of the next item inside the segment.
#[derive(Debug)]
pub struct InMemoryStore {
    table_name: String,
    item_count: u64,
    estimate: Result<u64, String>,
    readiness: Result<(), String>,
    failures: HashMap<(u32, u64), String>,
    page_delay: Option<Duration>,
    cancel_after: Option<(usize, CancelFlag)>,
    abort_on_cancel: Option<(usize, CancelFlag)>,
    calls: Mutex<Vec<(u32, Option<u64>)>>,
    call_count: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(table_name: impl Into<String>, item_count: u64) -> Self {
        Self {
            table_name: table_name.into(),
            item_count,
            estimate: Ok(item_count),
            readiness: Ok(()),
            failures: HashMap::new(),
            page_delay: None,
            cancel_after: None,
            abort_on_cancel: None,
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Fails the `page`-th (1-based) call of `segment`.
    pub fn with_failure(mut self, segment: u32, page: u64, diagnostic: impl Into<String>) -> Self {
        self.failures.insert((segment, page), diagnostic.into());
        self
    }

    pub fn with_estimate(mut self, estimate: Result<u64, String>) -> Self {
        self.estimate = estimate;
        self
    }

    pub fn not_ready(mut self, diagnostic: impl Into<String>) -> Self {
        self.readiness = Err(diagnostic.into());
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = Some(delay);
        self
    }

    /// Raises `flag` once `calls` scan calls have been served.
    pub fn cancel_after(mut self, calls: usize, flag: CancelFlag) -> Self {
        self.cancel_after = Some((calls, flag));
        self
    }

    /// Raises `flag` during the `call`-th scan call and fails that call, the
    /// way a store aborts an in-flight request on cancellation.
    pub fn abort_call_on_cancel(mut self, call: usize, flag: CancelFlag) -> Self {
        self.abort_on_cancel = Some((call, flag));
        self
    }

    /// Every scan call received so far as `(segment, continuation_token)`.
    pub fn calls(&self) -> Vec<(u32, Option<u64>)> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn segment_len(&self, segment_index: u32, total_segments: u32) -> u64 {
        let segment = u64::from(segment_index);
        let total = u64::from(total_segments);
        if segment >= self.item_count {
            return 0;
        }
        (self.item_count - segment).div_ceil(total)
    }
}

impl CountStore for InMemoryStore {
    type Token = u64;

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn wait_until_ready(&self) -> Result<(), String> {
        self.readiness.clone()
    }

    fn approximate_item_count(&self) -> Result<u64, String> {
        self.estimate.clone()
    }

    fn scan_page(&self, request: &ScanRequest<u64>) -> ScanPage<u64> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push((request.segment_index, request.continuation_token));
        let served = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((threshold, flag)) = &self.cancel_after {
            if served >= *threshold {
                flag.cancel();
            }
        }

        if let Some((call, flag)) = &self.abort_on_cancel {
            if served == *call {
                flag.cancel();
                return ScanPage::failure("cancelled");
            }
        }

        if let Some(delay) = self.page_delay {
            thread::sleep(delay);
        }

        let limit = u64::from(request.page_size_limit);
        let offset = request.continuation_token.unwrap_or(0);
        let page_number = offset / limit + 1;
        if let Some(diagnostic) = self.failures.get(&(request.segment_index, page_number)) {
            return ScanPage::failure(diagnostic.clone());
        }

        let segment_len = self.segment_len(request.segment_index, request.total_segments);
        let scanned = limit.min(segment_len.saturating_sub(offset));
        let next_offset = offset + scanned;
        let continuation_token = (next_offset < segment_len).then_some(next_offset);
        ScanPage::success(scanned, continuation_token)
    }
}

/// Progress reporter that keeps every call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    expected_total: Mutex<Option<Option<u64>>>,
    updates: Mutex<Vec<u64>>,
    finished: AtomicBool,
}

impl RecordingProgress {
    /// `None` until `start` is called.
    pub fn expected_total(&self) -> Option<Option<u64>> {
        *self.expected_total.lock().expect("poisoned mutex")
    }

    pub fn updates(&self) -> Vec<u64> {
        self.updates.lock().expect("poisoned mutex").clone()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl ProgressReporter for RecordingProgress {
    fn start(&self, expected_total: Option<u64>) {
        *self.expected_total.lock().expect("poisoned mutex") = Some(expected_total);
    }

    fn update(&self, current_value: u64) {
        self.updates.lock().expect("poisoned mutex").push(current_value);
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}
