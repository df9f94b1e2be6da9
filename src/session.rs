//! Form state for one analysis client.
//!
//! Holds the input mode, the typed URL or selected file, the run status and the
//! three result slots. Presentation layers call into this type; the HTTP call
//! itself lives in [`crate::backend`].

use crate::backend::AnalysisError;
use crate::model::{Agent, AnalysisInput, Mode, ResultSet, RunStatus};
use std::path::{Path, PathBuf};

/// What a result panel should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotView<'a> {
    Waiting { agent: Agent },
    Ready { agent: Agent, content: &'a str },
}

impl SlotView<'_> {
    pub fn placeholder(agent: Agent) -> String {
        format!("Waiting for {}...", agent.title())
    }
}

#[derive(Debug, Default, Clone)]
pub struct AnalysisSession {
    mode: Mode,
    url_input: String,
    file_input: Option<PathBuf>,
    status: RunStatus,
    results: ResultSet,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn url_input(&self) -> &str {
        &self.url_input
    }

    pub fn file_input(&self) -> Option<&Path> {
        self.file_input.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Inputs and mode tabs are disabled while a request is outstanding.
    pub fn inputs_disabled(&self) -> bool {
        self.is_running()
    }

    /// Whether the run control is enabled. Checks the raw URL, not the trimmed one.
    pub fn run_enabled(&self) -> bool {
        if self.is_running() {
            return false;
        }
        match self.mode {
            Mode::Url => !self.url_input.is_empty(),
            Mode::Upload => self.file_input.is_some(),
        }
    }

    /// Returns false when the inputs are disabled and nothing changed.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.inputs_disabled() {
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn set_url_input(&mut self, url: impl Into<String>) -> bool {
        if self.inputs_disabled() {
            return false;
        }
        self.url_input = url.into();
        true
    }

    pub fn url_input_mut(&mut self) -> Option<&mut String> {
        if self.inputs_disabled() {
            None
        } else {
            Some(&mut self.url_input)
        }
    }

    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> bool {
        if self.inputs_disabled() {
            return false;
        }
        self.file_input = Some(path.into());
        true
    }

    pub fn clear_file(&mut self) -> bool {
        if self.inputs_disabled() {
            return false;
        }
        self.file_input = None;
        true
    }

    /// Start a run if the preconditions hold.
    ///
    /// Clears every result slot, moves to `Running` and returns the input for
    /// the transport. Returns `None` and leaves the state untouched when the
    /// active input is missing or a run is already in flight.
    pub fn submit_analysis(&mut self) -> Option<AnalysisInput> {
        if self.is_running() {
            return None;
        }
        let input = match self.mode {
            Mode::Url if !self.url_input.trim().is_empty() => {
                AnalysisInput::Url(self.url_input.clone())
            }
            Mode::Upload => AnalysisInput::File(self.file_input.clone()?),
            Mode::Url => return None,
        };

        self.results = ResultSet::default();
        self.status = RunStatus::Running;
        Some(input)
    }

    /// Apply the outcome of the in-flight run.
    pub fn complete(&mut self, outcome: Result<ResultSet, AnalysisError>) {
        match outcome {
            Ok(results) => {
                self.results = results;
                self.status = RunStatus::Success;
            }
            Err(e) => {
                self.fail(&e.to_string());
            }
        }
    }

    /// Record a failure that did not come from the transport.
    pub fn fail(&mut self, message: &str) {
        self.results.explicator = format!("Error: {message}");
        self.status = RunStatus::Error;
    }

    pub fn render_slot(&self, agent: Agent) -> SlotView<'_> {
        let content = self.results.get(agent);
        if content.is_empty() {
            SlotView::Waiting { agent }
        } else {
            SlotView::Ready { agent, content }
        }
    }
}
