//! Text summary builder for CLI output.
//!
//! Formats a finished run as titled sections, one per agent.

use crate::model::{Agent, AnalysisRecord, RunStatus};
use crate::session::SlotView;
use std::time::Duration;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(record: &AnalysisRecord) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Source: {}", record.source));
    lines.push(format!(
        "Status: {:?} in {}",
        record.status,
        humantime::format_duration(Duration::from_secs(record.elapsed_ms / 1000))
    ));

    if record.status == RunStatus::Error {
        lines.push(String::new());
        lines.push(record.results.explicator.clone());
        return TextSummary { lines };
    }

    for agent in Agent::ALL {
        lines.push(String::new());
        lines.push(format!("== {} ==", agent.title()));
        lines.push(agent.description().to_string());
        lines.push(String::new());
        let content = record.results.get(agent);
        if content.is_empty() {
            lines.push(SlotView::placeholder(agent));
        } else {
            lines.extend(content.lines().map(str::to_string));
        }
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisInput, ResultSet};
    use pretty_assertions::assert_eq;

    #[test]
    fn sections_follow_agent_order() {
        let record = AnalysisRecord::new(
            &AnalysisInput::Url("https://example.org/p".into()),
            RunStatus::Success,
            65_000,
            ResultSet {
                explicator: "line one\nline two".into(),
                visionary: "v".into(),
                practitioner: String::new(),
            },
        );
        let summary = build_text_summary(&record);

        assert_eq!(summary.lines[1], "Status: Success in 1m 5s");
        let headers: Vec<&String> = summary
            .lines
            .iter()
            .filter(|l| l.starts_with("== "))
            .collect();
        assert_eq!(
            headers,
            vec![
                "== The Explicator ==",
                "== The Visionary ==",
                "== The Practitioner =="
            ]
        );
        assert!(summary.lines.contains(&"line two".to_string()));
        assert!(summary
            .lines
            .contains(&"Waiting for The Practitioner...".to_string()));
    }

    #[test]
    fn error_run_prints_only_the_message() {
        let record = AnalysisRecord::new(
            &AnalysisInput::Url("x".into()),
            RunStatus::Error,
            0,
            ResultSet {
                explicator: "Error: bad input".into(),
                ..ResultSet::default()
            },
        );
        let summary = build_text_summary(&record);
        assert_eq!(summary.lines.last().unwrap(), "Error: bad input");
        assert!(!summary.lines.iter().any(|l| l.starts_with("== ")));
    }
}
