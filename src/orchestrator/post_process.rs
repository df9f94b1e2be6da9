//! Post-run processing utilities.
//!
//! Builds the run record and handles exports after a run completes.

use crate::model::{AnalysisInput, AnalysisRecord, RunStatus};
use crate::session::AnalysisSession;
use crate::storage;
use std::path::Path;

/// Result of post-run processing, ready for presentation layers.
pub(crate) struct ProcessedRun {
    pub record: AnalysisRecord,
    pub export_messages: Vec<String>,
}

/// Snapshot the finished session and write the requested exports.
pub(crate) fn process_run_completion(
    export_json: Option<&Path>,
    input: &AnalysisInput,
    session: &AnalysisSession,
    elapsed_ms: u64,
) -> ProcessedRun {
    let record = AnalysisRecord::new(
        input,
        session.status(),
        elapsed_ms,
        session.results().clone(),
    );

    let mut export_messages = Vec::new();
    if let Some(export_path) = export_json {
        if record.status == RunStatus::Success {
            match storage::export_json(export_path, &record) {
                Ok(_) => export_messages.push(format!("Exported JSON: {}", export_path.display())),
                Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
            }
        } else {
            tracing::debug!("skipping export of failed run");
        }
    }

    ProcessedRun {
        record,
        export_messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResultSet;
    use pretty_assertions::assert_eq;

    #[test]
    fn successful_run_is_exported() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.json");

        let mut session = AnalysisSession::new();
        session.set_url_input("https://example.org/p");
        let input = session.submit_analysis().unwrap();
        session.complete(Ok(ResultSet {
            explicator: "e".into(),
            visionary: "v".into(),
            practitioner: "p".into(),
        }));

        let processed = process_run_completion(Some(&out), &input, &session, 1200);
        assert_eq!(processed.record.source, "https://example.org/p");
        assert_eq!(processed.record.elapsed_ms, 1200);
        assert_eq!(processed.export_messages.len(), 1);

        let saved: AnalysisRecord =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(saved, processed.record);
    }

    #[test]
    fn failed_run_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.json");

        let mut session = AnalysisSession::new();
        session.set_url_input("https://example.org/p");
        let input = session.submit_analysis().unwrap();
        session.fail("boom");

        let processed = process_run_completion(Some(&out), &input, &session, 5);
        assert_eq!(processed.record.status, RunStatus::Error);
        assert!(processed.export_messages.is_empty());
        assert!(!out.exists());
    }
}
