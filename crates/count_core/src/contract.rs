use serde::{Deserialize, Serialize};

pub const DEFAULT_TOTAL_SEGMENTS: u32 = 1;
pub const DEFAULT_PAGE_SIZE_LIMIT: u32 = 500;
/// Upper bound the store accepts for `TotalSegments`.
pub const MAX_TOTAL_SEGMENTS: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    Strong,
}

/// One count-only scan call for a single segment.
///
/// `continuation_token` is `None` for the first page of a segment and carries
/// the previous page's token afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest<T> {
    pub segment_index: u32,
    pub total_segments: u32,
    pub page_size_limit: u32,
    pub continuation_token: Option<T>,
    pub consistency: Consistency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Success,
    Failure,
}

/// Result of one scan call. A `None` token marks the segment as exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage<T> {
    pub item_count: u64,
    pub continuation_token: Option<T>,
    pub status: PageStatus,
    pub raw_diagnostic: Option<String>,
}

impl<T> ScanPage<T> {
    pub fn success(item_count: u64, continuation_token: Option<T>) -> Self {
        Self {
            item_count,
            continuation_token,
            status: PageStatus::Success,
            raw_diagnostic: None,
        }
    }

    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self {
            item_count: 0,
            continuation_token: None,
            status: PageStatus::Failure,
            raw_diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == PageStatus::Failure
    }
}

/// How a segment's pagination loop ended.
///
/// `resume_token` is the last continuation token that was accepted before the
/// loop stopped (`None` means the segment would restart from its beginning).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentOutcome {
    Exhausted,
    Failed {
        diagnostic: String,
        resume_token: Option<String>,
    },
    Cancelled {
        resume_token: Option<String>,
    },
}

impl SegmentOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentReport {
    pub segment_index: u32,
    pub cumulative_count: u64,
    pub pages_fetched: u64,
    pub outcome: SegmentOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountReport {
    pub table_name: String,
    pub total_count: u64,
    pub estimated_total: Option<u64>,
    pub total_segments: u32,
    pub page_size_limit: u32,
    pub segments: Vec<SegmentReport>,
    pub elapsed_ms: u64,
}

impl CountReport {
    pub fn segment_sum(&self) -> u64 {
        self.segments
            .iter()
            .map(|segment| segment.cumulative_count)
            .sum()
    }

    /// Segments that stopped before reaching the end of their key range.
    pub fn incomplete_segments(&self) -> impl Iterator<Item = &SegmentReport> {
        self.segments
            .iter()
            .filter(|segment| !segment.outcome.is_exhausted())
    }

    pub fn is_complete(&self) -> bool {
        self.incomplete_segments().next().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}
