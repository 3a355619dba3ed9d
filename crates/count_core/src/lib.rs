//! Consistent, parallel item counting over a segmented key-value table scan.
//!
//! A full-table scan is split into `total_segments` disjoint segments. Each
//! segment is paged through by its own worker using count-only, strongly
//! consistent scan calls, and every page's count is added to one shared
//! accumulator that also drives the progress display.
//!
//! # Quick Start
//!
//! ```no_run
//! use count_core::{count_table, SilentProgress};
//! use count_core::test_helpers::InMemoryStore;
//!
//! let store = InMemoryStore::new("orders", 10_000);
//! let report = count_table(&store, 4, 500, &SilentProgress).unwrap();
//! assert_eq!(report.total_count, 10_000);
//! ```
//!
//! # Architecture
//!
//! - [`fetcher`]: one count-only scan call for a segment
//! - [`worker`]: pagination loop for a single segment
//! - [`aggregator`]: serialized running total and progress updates
//! - [`coordinator`]: readiness wait, worker fan-out and join
//! - [`store`]: the store boundary implemented by adapters

pub mod aggregator;
pub mod contract;
pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod plan;
pub mod progress;
pub mod store;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod worker;

pub use aggregator::{AggregateState, Aggregator};
pub use contract::{
    Consistency, CountReport, PageStatus, ScanPage, ScanRequest, SegmentOutcome, SegmentReport,
    ValidationError, DEFAULT_PAGE_SIZE_LIMIT, DEFAULT_TOTAL_SEGMENTS, MAX_TOTAL_SEGMENTS,
};
pub use coordinator::{count_table, CoordinatorPhase, ScanCoordinator};
pub use error::CountError;
pub use fetcher::PageFetcher;
pub use plan::ScanPlan;
pub use progress::{BarProgress, ProgressReporter, SilentProgress};
pub use store::{CancelFlag, CountStore};
pub use worker::{SegmentState, SegmentWorker};
