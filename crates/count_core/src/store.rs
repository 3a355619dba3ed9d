use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::contract::{ScanPage, ScanRequest};

/// Remote key-value store that can answer count-only segmented scans.
///
/// Implementations are shared read-only by every segment worker, so they must
/// be `Sync`. The table being counted is bound into the implementation.
pub trait CountStore: Sync {
    /// Opaque resume marker returned by a paginated scan.
    type Token: Clone + Send + fmt::Debug;

    fn table_name(&self) -> &str;

    /// Blocks until the table exists and is ready to be scanned.
    fn wait_until_ready(&self) -> Result<(), String>;

    /// Approximate pre-scan size; used for progress display only.
    fn approximate_item_count(&self) -> Result<u64, String>;

    /// Performs one count-only scan call. Transport and service errors are
    /// reported as a failure page rather than an `Err`.
    fn scan_page(&self, request: &ScanRequest<Self::Token>) -> ScanPage<Self::Token>;

    /// Text form of a continuation token, as reported for segments that
    /// stopped early. Stores override this with a form their scan call accepts
    /// back as a start key.
    fn encode_token(&self, token: &Self::Token) -> String {
        format!("{token:?}")
    }
}

/// Shared cancellation signal checked by workers between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_visible_through_clones() {
        let flag = CancelFlag::default();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());

        flag.cancel();
        assert!(observer.is_cancelled());
    }
}
