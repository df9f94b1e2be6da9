use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("research-analysis-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Which input path is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Url,
    Upload,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Url => Mode::Upload,
            Mode::Upload => Mode::Url,
        }
    }

    /// Backend endpoint for this mode.
    pub fn endpoint(self) -> &'static str {
        match self {
            Mode::Url => "/analyze_url",
            Mode::Upload => "/analyze_file",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Url => "Analyze Link",
            Mode::Upload => "Upload PDF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Ready,
    Running,
    Success,
    Error,
}

/// One of the three result categories produced by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Explicator,
    Visionary,
    Practitioner,
}

impl Agent {
    pub const ALL: [Agent; 3] = [Agent::Explicator, Agent::Visionary, Agent::Practitioner];

    pub fn key(self) -> &'static str {
        match self {
            Agent::Explicator => "explicator",
            Agent::Visionary => "visionary",
            Agent::Practitioner => "practitioner",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Agent::Explicator => "The Explicator",
            Agent::Visionary => "The Visionary",
            Agent::Practitioner => "The Practitioner",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Agent::Explicator => "Explains the core concepts and methodology.",
            Agent::Visionary => "Proposes future research and applications.",
            Agent::Practitioner => "Provides implementation logic/code.",
        }
    }
}

/// The three result slots. An empty string means the result has not arrived.
///
/// Deserializes straight from the backend's success body; missing or null
/// fields are left empty rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub explicator: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub visionary: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub practitioner: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResultSet {
    pub fn get(&self, agent: Agent) -> &str {
        match agent {
            Agent::Explicator => &self.explicator,
            Agent::Visionary => &self.visionary,
            Agent::Practitioner => &self.practitioner,
        }
    }

    pub fn is_empty(&self) -> bool {
        Agent::ALL.iter().all(|a| self.get(*a).is_empty())
    }
}

/// Input handed to the transport when a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisInput {
    Url(String),
    File(PathBuf),
}

impl AnalysisInput {
    pub fn mode(&self) -> Mode {
        match self {
            AnalysisInput::Url(_) => Mode::Url,
            AnalysisInput::File(_) => Mode::Upload,
        }
    }

    /// Short human-readable description of the source.
    pub fn source_label(&self) -> String {
        match self {
            AnalysisInput::Url(url) => url.clone(),
            AnalysisInput::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

#[derive(Debug)]
pub enum AnalysisEvent {
    RunStarted {
        input: AnalysisInput,
    },
    RunCompleted {
        input: AnalysisInput,
        outcome: Result<ResultSet, crate::backend::AnalysisError>,
        elapsed_ms: u64,
    },
    Info(String),
}

/// Serializable snapshot of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub timestamp_utc: String,
    pub mode: Mode,
    pub source: String,
    pub status: RunStatus,
    pub elapsed_ms: u64,
    pub results: ResultSet,
}

impl AnalysisRecord {
    pub fn new(
        input: &AnalysisInput,
        status: RunStatus,
        elapsed_ms: u64,
        results: ResultSet,
    ) -> Self {
        Self {
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            mode: input.mode(),
            source: input.source_label(),
            status,
            elapsed_ms,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn result_set_tolerates_missing_fields() {
        let parsed: ResultSet = serde_json::from_str(r#"{"explicator":"only this"}"#).unwrap();
        assert_eq!(parsed.explicator, "only this");
        assert_eq!(parsed.visionary, "");
        assert_eq!(parsed.practitioner, "");
    }

    #[test]
    fn result_set_treats_null_as_empty() {
        let parsed: ResultSet =
            serde_json::from_str(r#"{"explicator":"e","visionary":null,"practitioner":"p"}"#)
                .unwrap();
        assert_eq!(parsed.visionary, "");
        assert_eq!(parsed.practitioner, "p");
    }

    #[test]
    fn file_input_uses_file_name_as_source() {
        let input = AnalysisInput::File(PathBuf::from("/tmp/papers/attention.pdf"));
        assert_eq!(input.mode(), Mode::Upload);
        assert_eq!(input.source_label(), "attention.pdf");
    }

    #[test]
    fn modes_map_to_fixed_endpoints() {
        assert_eq!(Mode::Url.endpoint(), "/analyze_url");
        assert_eq!(Mode::Upload.endpoint(), "/analyze_file");
        assert_eq!(Mode::Url.toggled(), Mode::Upload);
    }
}
