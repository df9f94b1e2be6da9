use crate::backend::AnalysisBackend;
use crate::model::{AnalysisConfig, Mode, RunStatus, DEFAULT_BASE_URL};
use crate::session::AnalysisSession;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "research-analysis",
    version,
    about = "Submit a research paper to the multi-agent analysis backend"
)]
pub struct Cli {
    /// Base URL of the analysis backend
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Paper URL (PDF or webpage) to analyze
    #[arg(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Local PDF file to upload
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Print JSON result and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Export successful results as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Start the analysis as soon as the TUI opens (needs --url or --file)
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub run_on_launch: bool,

    /// Log file for the TUI (defaults to the user cache directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        !self.json && !self.text
    }
}

/// Dispatch to the TUI or a single non-interactive run.
///
/// Returns the final run status so the caller can pick an exit code.
pub async fn run(args: Cli) -> Result<RunStatus> {
    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            crate::tui::run(args).await?;
            return Ok(RunStatus::Ready);
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_once(args, false).await;
        }
    }

    let json = args.json;
    run_once(args, json).await
}

/// Build an `AnalysisConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> AnalysisConfig {
    AnalysisConfig {
        base_url: args.base_url.clone(),
        ..AnalysisConfig::default()
    }
}

/// Seed a session from `--url` / `--file`.
pub fn build_session(args: &Cli) -> AnalysisSession {
    let mut session = AnalysisSession::new();
    if let Some(url) = args.url.as_deref() {
        session.set_url_input(url);
    }
    if let Some(file) = args.file.as_ref() {
        session.select_file(file.clone());
        session.set_mode(Mode::Upload);
    }
    session
}

async fn run_once(args: Cli, json: bool) -> Result<RunStatus> {
    let backend = AnalysisBackend::new(&build_config(&args)).context("configure backend")?;
    let mut session = build_session(&args);
    let input = session
        .submit_analysis()
        .context("nothing to analyze: pass --url <URL> or --file <PDF>")?;

    let (out_tx, out_handle) = spawn_output_writer();
    if !json {
        let _ = out_tx.send(OutputLine::Stderr(format!(
            "Processing {}...",
            input.source_label()
        )));
    }

    let started = Instant::now();
    let outcome = backend.analyze(&input).await;
    session.complete(outcome);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let processed = crate::orchestrator::process_run_completion(
        args.export_json.as_deref(),
        &input,
        &session,
        elapsed_ms,
    );

    if json {
        let out = serde_json::to_string_pretty(&processed.record)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = crate::text_summary::build_text_summary(&processed.record);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    for msg in processed.export_messages {
        let _ = out_tx.send(OutputLine::Stderr(msg));
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(session.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn file_flag_selects_upload_mode() {
        let args = Cli::parse_from(["research-analysis", "--file", "/tmp/paper.pdf", "--text"]);
        let session = build_session(&args);
        assert_eq!(session.mode(), Mode::Upload);
        assert!(session.run_enabled());
        assert!(!args.is_interactive());
    }

    #[test]
    fn url_and_file_conflict() {
        let res = Cli::try_parse_from([
            "research-analysis",
            "--url",
            "https://example.org",
            "--file",
            "a.pdf",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let args = Cli::parse_from(["research-analysis"]);
        assert_eq!(build_config(&args).base_url, "http://127.0.0.1:8000");
        assert!(args.is_interactive());
        assert!(!args.run_on_launch);
    }

    #[tokio::test]
    async fn single_run_without_input_is_an_error() {
        let args = Cli::parse_from(["research-analysis", "--json"]);
        assert!(run_once(args, true).await.is_err());
    }

    #[tokio::test]
    async fn single_run_reports_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze_url"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&server)
            .await;

        let base = server.uri();
        let args = Cli::parse_from([
            "research-analysis",
            "--base-url",
            base.as_str(),
            "--url",
            "https://example.org/p",
            "--text",
        ]);
        assert_eq!(run_once(args, false).await.unwrap(), RunStatus::Error);
    }
}
