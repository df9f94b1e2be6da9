//! Run lifecycle controller.
//!
//! Owns the single in-flight request and emits events for presentation layers.

use crate::backend::{AnalysisBackend, AnalysisError};
use crate::model::{AnalysisEvent, AnalysisInput, ResultSet};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(AnalysisInput),
    Quit,
}

/// Internal handle for a running request.
struct RunCtx {
    input: AnalysisInput,
    started: Instant,
    handle: Option<tokio::task::JoinHandle<Result<ResultSet, AnalysisError>>>,
}

fn start_run(backend: &Arc<AnalysisBackend>, input: AnalysisInput) -> RunCtx {
    let backend = backend.clone();
    let task_input = input.clone();
    let handle = tokio::spawn(async move { backend.analyze(&task_input).await });
    RunCtx {
        input,
        started: Instant::now(),
        handle: Some(handle),
    }
}

/// Completion event for a finished run, including a task that panicked or was cancelled.
fn finish_run(
    ctx: RunCtx,
    join_res: Result<Result<ResultSet, AnalysisError>, tokio::task::JoinError>,
) -> AnalysisEvent {
    let elapsed_ms = ctx.started.elapsed().as_millis() as u64;
    let outcome = join_res.unwrap_or_else(|e| Err(AnalysisError::Task(e.to_string())));
    match &outcome {
        Ok(_) => tracing::info!(elapsed_ms, "analysis completed"),
        Err(e) => tracing::warn!(elapsed_ms, error = %e, "analysis failed"),
    }
    AnalysisEvent::RunCompleted {
        input: ctx.input,
        outcome,
        elapsed_ms,
    }
}

/// Serve UI commands until quit, running at most one analysis at a time.
pub(crate) async fn run_controller(
    backend: Arc<AnalysisBackend>,
    event_tx: UnboundedSender<AnalysisEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut run_ctx: Option<RunCtx> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(input)) => {
                        if run_ctx.is_some() {
                            tracing::warn!("submit ignored: analysis already running");
                            let _ = event_tx.send(AnalysisEvent::Info(
                                "An analysis is already running".into(),
                            ));
                            continue;
                        }
                        tracing::debug!(source = %input.source_label(), "starting run");
                        let _ = event_tx.send(AnalysisEvent::RunStarted { input: input.clone() });
                        run_ctx = Some(start_run(&backend, input));
                    }
                    Some(UiCommand::Quit) | None => {
                        // No user-facing cancel exists; only teardown drops the request.
                        if let Some(handle) = run_ctx.as_mut().and_then(|ctx| ctx.handle.take()) {
                            handle.abort();
                        }
                        return Ok(());
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let (Some(join_res), Some(ctx)) = (maybe_done, run_ctx.take()) {
                    let _ = event_tx.send(finish_run(ctx, join_res));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnalysisConfig;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn recv(rx: &mut UnboundedReceiver<AnalysisEvent>) -> AnalysisEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn overlapping_submit_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze_url"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(300))
                    .set_body_json(serde_json::json!({
                        "explicator": "a", "visionary": "b", "practitioner": "c"
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = Arc::new(
            AnalysisBackend::new(&AnalysisConfig {
                base_url: server.uri(),
                ..AnalysisConfig::default()
            })
            .unwrap(),
        );
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(run_controller(backend, event_tx, cmd_rx));

        let input = AnalysisInput::Url("https://example.org/p".into());
        cmd_tx.send(UiCommand::Submit(input.clone())).unwrap();
        cmd_tx.send(UiCommand::Submit(input)).unwrap();

        assert!(matches!(
            recv(&mut event_rx).await,
            AnalysisEvent::RunStarted { .. }
        ));
        assert!(matches!(recv(&mut event_rx).await, AnalysisEvent::Info(_)));
        match recv(&mut event_rx).await {
            AnalysisEvent::RunCompleted { outcome, .. } => {
                assert_eq!(outcome.unwrap().practitioner, "c");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        cmd_tx.send(UiCommand::Quit).unwrap();
        controller.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn failure_is_reported_as_completed_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze_url"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "bad input"
            })))
            .mount(&server)
            .await;

        let backend = Arc::new(
            AnalysisBackend::new(&AnalysisConfig {
                base_url: server.uri(),
                ..AnalysisConfig::default()
            })
            .unwrap(),
        );
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(run_controller(backend, event_tx, cmd_rx));

        cmd_tx
            .send(UiCommand::Submit(AnalysisInput::Url("x".into())))
            .unwrap();
        let _started = recv(&mut event_rx).await;
        match recv(&mut event_rx).await {
            AnalysisEvent::RunCompleted { outcome, .. } => {
                assert_eq!(outcome.unwrap_err().to_string(), "bad input");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        drop(cmd_tx);
        controller.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn cancelled_task_still_completes_the_run() {
        let handle = tokio::spawn(futures::future::pending::<Result<ResultSet, AnalysisError>>());
        handle.abort();
        let join_res = handle.await;
        assert!(join_res.is_err());

        let ctx = RunCtx {
            input: AnalysisInput::Url("x".into()),
            started: Instant::now(),
            handle: None,
        };
        match finish_run(ctx, join_res) {
            AnalysisEvent::RunCompleted { input, outcome, .. } => {
                assert_eq!(input, AnalysisInput::Url("x".into()));
                let err = outcome.unwrap_err();
                assert!(matches!(err, AnalysisError::Task(_)));
                assert!(err.to_string().starts_with("analysis task failed"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn task_failure_unlocks_the_session() {
        let mut session = crate::session::AnalysisSession::new();
        session.set_url_input("https://x.org");
        session.submit_analysis().unwrap();
        session.complete(Err(AnalysisError::Task("task panicked".into())));
        assert_eq!(session.status(), crate::model::RunStatus::Error);
        assert!(!session.inputs_disabled());
    }
}
