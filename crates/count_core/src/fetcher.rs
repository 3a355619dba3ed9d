use tracing::trace;

use crate::contract::ScanPage;
use crate::plan::ScanPlan;
use crate::store::CountStore;

/// Issues count-only scan calls for one segment of a plan.
pub struct PageFetcher<'a, S: CountStore> {
    store: &'a S,
    plan: ScanPlan,
    segment_index: u32,
}

impl<'a, S: CountStore> PageFetcher<'a, S> {
    pub fn new(store: &'a S, plan: ScanPlan, segment_index: u32) -> Self {
        Self {
            store,
            plan,
            segment_index,
        }
    }

    pub fn segment_index(&self) -> u32 {
        self.segment_index
    }

    pub fn encode_token(&self, token: &S::Token) -> String {
        self.store.encode_token(token)
    }

    pub fn fetch(&self, continuation_token: Option<S::Token>) -> ScanPage<S::Token> {
        let request = self.plan.request_for(self.segment_index, continuation_token);
        let page = self.store.scan_page(&request);
        trace!(
            segment = self.segment_index,
            item_count = page.item_count,
            status = ?page.status,
            has_more = page.continuation_token.is_some(),
            "scan page returned"
        );
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryStore;

    #[test]
    fn fetch_targets_its_own_segment() {
        let store = InMemoryStore::new("events", 40);
        let plan = ScanPlan::new(4, 3).expect("plan should pass");
        let fetcher = PageFetcher::new(&store, plan, 2);

        let first = fetcher.fetch(None);
        let second = fetcher.fetch(first.continuation_token);

        assert_eq!(first.item_count, 3);
        assert_eq!(second.item_count, 3);
        assert_eq!(store.calls(), vec![(2, None), (2, Some(3))]);
    }
}
