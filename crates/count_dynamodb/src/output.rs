use std::fmt::Write as _;

use count_core::{CountReport, SegmentOutcome};

use crate::cli::OutputFormat;

/// Renders the final report for stdout. Silent runs print the bare total.
///
/// The estimate is not repeated here: it is printed before the scan starts.
pub fn render_report(
    report: &CountReport,
    format: OutputFormat,
    silent: bool,
) -> Result<String, serde_json::Error> {
    if silent {
        return Ok(report.total_count.to_string());
    }

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_text(report: &CountReport) -> String {
    let mut text = String::new();
    for segment in report.incomplete_segments() {
        let reason = match &segment.outcome {
            SegmentOutcome::Failed { diagnostic, .. } => diagnostic.as_str(),
            SegmentOutcome::Cancelled { .. } => "cancelled",
            SegmentOutcome::Exhausted => continue,
        };
        let _ = writeln!(
            text,
            "Segment {} stopped early after {} items: {reason}",
            segment.segment_index, segment.cumulative_count
        );
    }

    let _ = writeln!(text, "Scanned item count: {}", report.total_count);
    let _ = write!(text, "Execution time {} seconds", report.elapsed_ms / 1_000);
    text
}

#[cfg(test)]
mod tests {
    use count_core::SegmentReport;
    use serde_json::Value;

    use super::*;

    fn sample_report() -> CountReport {
        CountReport {
            table_name: "orders".to_string(),
            total_count: 120,
            estimated_total: Some(100),
            total_segments: 2,
            page_size_limit: 500,
            segments: vec![
                SegmentReport {
                    segment_index: 0,
                    cumulative_count: 100,
                    pages_fetched: 1,
                    outcome: SegmentOutcome::Exhausted,
                },
                SegmentReport {
                    segment_index: 1,
                    cumulative_count: 20,
                    pages_fetched: 2,
                    outcome: SegmentOutcome::Failed {
                        diagnostic: "ThrottlingException".to_string(),
                        resume_token: None,
                    },
                },
            ],
            elapsed_ms: 4_250,
        }
    }

    #[test]
    fn silent_output_is_the_bare_total() {
        let rendered = render_report(&sample_report(), OutputFormat::Json, true)
            .expect("report should render");
        assert_eq!(rendered, "120");
    }

    #[test]
    fn text_output_lists_early_stops_and_true_total() {
        let rendered = render_report(&sample_report(), OutputFormat::Text, false)
            .expect("report should render");

        assert_eq!(
            rendered,
            "Segment 1 stopped early after 20 items: ThrottlingException\n\
             Scanned item count: 120\n\
             Execution time 4 seconds"
        );
    }

    #[test]
    fn json_output_contains_segment_outcomes() {
        let rendered = render_report(&sample_report(), OutputFormat::Json, false)
            .expect("report should render");
        let value: Value = serde_json::from_str(&rendered).expect("output should be json");

        assert_eq!(value["total_count"], 120);
        assert_eq!(value["segments"][1]["outcome"]["status"], "failed");
    }
}
