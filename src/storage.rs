use crate::model::AnalysisRecord;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Write a run record as pretty JSON, creating parent directories as needed.
pub fn export_json(path: &Path, record: &AnalysisRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(record).context("serialize run record")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), "exported run");
    Ok(())
}

/// Default file name for a record, derived from its timestamp.
pub fn default_export_name(record: &AnalysisRecord) -> String {
    format!(
        "research-analysis-{}.json",
        record.timestamp_utc.replace(':', "-").replace('T', "_")
    )
}

/// Export into `dir` under the default name and return the absolute path.
pub fn export_to_dir(dir: &Path, record: &AnalysisRecord) -> Result<PathBuf> {
    let path = dir.join(default_export_name(record));
    export_json(&path, record)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisInput, ResultSet, RunStatus};
    use pretty_assertions::assert_eq;

    fn record() -> AnalysisRecord {
        let mut r = AnalysisRecord::new(
            &AnalysisInput::Url("https://example.org/p".into()),
            RunStatus::Success,
            42,
            ResultSet {
                explicator: "e".into(),
                visionary: "v".into(),
                practitioner: "p".into(),
            },
        );
        r.timestamp_utc = "2026-10-19T08:30:00Z".into();
        r
    }

    #[test]
    fn export_name_is_filesystem_safe() {
        assert_eq!(
            default_export_name(&record()),
            "research-analysis-2026-10-19_08-30-00Z.json"
        );
    }

    #[test]
    fn export_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let path = export_to_dir(&nested, &record()).unwrap();
        assert!(path.starts_with(&nested));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"mode\": \"url\""));
        assert!(raw.contains("\"status\": \"success\""));
    }
}
