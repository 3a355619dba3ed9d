mod support;

use count_core::test_helpers::InMemoryStore;
use count_core::SegmentOutcome;
use support::count_silently;

#[test]
fn failure_on_kth_page_contributes_pages_one_through_k() {
    for failing_page in 1..=5u64 {
        let store = InMemoryStore::new("orders", 200).with_failure(0, failing_page, "503 Service Unavailable");
        let report = count_silently(&store, 1, 20);
        let segment = &report.segments[0];

        // The failing page itself carries no count.
        assert_eq!(segment.cumulative_count, (failing_page - 1) * 20);
        assert_eq!(segment.pages_fetched, failing_page);
        assert_eq!(store.calls().len() as u64, failing_page);
        assert_eq!(report.total_count, segment.cumulative_count);
    }
}

#[test]
fn later_pages_of_a_failed_segment_are_never_fetched() {
    let store = InMemoryStore::new("orders", 300).with_failure(2, 2, "ThrottlingException");
    count_silently(&store, 3, 10);

    let failed_segment_tokens: Vec<Option<u64>> = store
        .calls()
        .into_iter()
        .filter(|(segment, _)| *segment == 2)
        .map(|(_, token)| token)
        .collect();
    assert_eq!(failed_segment_tokens, vec![None, Some(10)]);
}

#[test]
fn failed_segment_reports_last_good_token() {
    let store = InMemoryStore::new("orders", 50).with_failure(0, 4, "connection reset");
    let report = count_silently(&store, 1, 10);

    assert_eq!(
        report.segments[0].outcome,
        SegmentOutcome::Failed {
            diagnostic: "connection reset".to_string(),
            resume_token: Some("30".to_string()),
        }
    );
}

#[test]
fn failure_on_first_page_keeps_a_zero_count() {
    let store = InMemoryStore::new("orders", 50).with_failure(0, 1, "AccessDenied");
    let report = count_silently(&store, 1, 10);

    assert_eq!(report.total_count, 0);
    assert_eq!(
        report.segments[0].outcome,
        SegmentOutcome::Failed {
            diagnostic: "AccessDenied".to_string(),
            resume_token: None,
        }
    );
}
