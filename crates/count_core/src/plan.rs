use std::ops::Range;

use crate::contract::{Consistency, ScanRequest, ValidationError, MAX_TOTAL_SEGMENTS};

/// Validated segmentation of a full-table scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPlan {
    total_segments: u32,
    page_size_limit: u32,
}

impl ScanPlan {
    pub fn new(total_segments: u32, page_size_limit: u32) -> Result<Self, ValidationError> {
        if total_segments == 0 {
            return Err(ValidationError::new("total_segments must be at least 1"));
        }

        if total_segments > MAX_TOTAL_SEGMENTS {
            return Err(ValidationError::new(format!(
                "total_segments {total_segments} exceeds the maximum of {MAX_TOTAL_SEGMENTS}"
            )));
        }

        if page_size_limit == 0 {
            return Err(ValidationError::new("page_size_limit must be at least 1"));
        }

        Ok(Self {
            total_segments,
            page_size_limit,
        })
    }

    pub fn total_segments(&self) -> u32 {
        self.total_segments
    }

    pub fn page_size_limit(&self) -> u32 {
        self.page_size_limit
    }

    pub fn segment_indexes(&self) -> Range<u32> {
        0..self.total_segments
    }

    pub fn request_for<T>(&self, segment_index: u32, continuation_token: Option<T>) -> ScanRequest<T> {
        debug_assert!(segment_index < self.total_segments);
        ScanRequest {
            segment_index,
            total_segments: self.total_segments,
            page_size_limit: self.page_size_limit,
            continuation_token,
            consistency: Consistency::Strong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_segments() {
        let error = ScanPlan::new(0, 500).expect_err("zero segments should fail");
        assert_eq!(error.message(), "total_segments must be at least 1");
    }

    #[test]
    fn rejects_zero_page_limit() {
        let error = ScanPlan::new(4, 0).expect_err("zero limit should fail");
        assert_eq!(error.message(), "page_size_limit must be at least 1");
    }

    #[test]
    fn rejects_segments_above_store_maximum() {
        let error = ScanPlan::new(MAX_TOTAL_SEGMENTS + 1, 500).expect_err("plan should fail");
        assert_eq!(
            error.message(),
            format!(
                "total_segments {} exceeds the maximum of {MAX_TOTAL_SEGMENTS}",
                MAX_TOTAL_SEGMENTS + 1
            )
        );
    }

    #[test]
    fn segment_indexes_cover_every_segment_once() {
        let plan = ScanPlan::new(5, 100).expect("plan should pass");
        let indexes: Vec<u32> = plan.segment_indexes().collect();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn requests_are_strongly_consistent() {
        let plan = ScanPlan::new(3, 25).expect("plan should pass");
        let request = plan.request_for(2, Some("token"));

        assert_eq!(request.segment_index, 2);
        assert_eq!(request.total_segments, 3);
        assert_eq!(request.page_size_limit, 25);
        assert_eq!(request.continuation_token, Some("token"));
        assert_eq!(request.consistency, Consistency::Strong);
    }
}
