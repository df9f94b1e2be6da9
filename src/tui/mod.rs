mod export;
mod help;
mod state;

use crate::backend::AnalysisBackend;
use crate::cli::Cli;
use crate::model::{Agent, AnalysisEvent, Mode, RunStatus};
use crate::orchestrator::{self, UiCommand};
use crate::session::SlotView;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{agent_color, push_wrapped_status_kv, UiState};
use std::path::Path;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const INPUT_NOTE: &str = "* Optimized for research papers up to approx. 50 pages.";
const URL_PLACEHOLDER: &str = "Paste research paper URL (PDF or Webpage)...";
const PATH_PLACEHOLDER: &str = "Type a PDF path and press Enter to select it";

pub async fn run(args: Cli) -> Result<()> {
    let backend = Arc::new(
        AnalysisBackend::new(&crate::cli::build_config(&args)).context("configure backend")?,
    );

    // Unbounded channels keep the UI thread from ever waiting on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AnalysisEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(backend, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

fn initial_state(args: &Cli) -> UiState {
    let mut state = UiState {
        session: crate::cli::build_session(args),
        backend_url: args.base_url.clone(),
        export_json: args.export_json.clone(),
        ..Default::default()
    };
    if let Some(file) = args.file.as_ref() {
        state.path_input = file.display().to_string();
    }
    state
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<AnalysisEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = initial_state(&args);
    if args.run_on_launch {
        if let Some(cmd) = submit(&mut state) {
            let _ = cmd_tx.send(cmd);
        }
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(cmd) = handle_key(&mut state, k) {
                    let quit = matches!(cmd, UiCommand::Quit);
                    let _ = cmd_tx.send(cmd);
                    if quit {
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Start a run from the current form, or explain why nothing happened.
fn submit(state: &mut UiState) -> Option<UiCommand> {
    match state.session.submit_analysis() {
        Some(input) => {
            state.run_started = Some(Instant::now());
            state.scroll = 0;
            state.info = format!("Processing {}...", input.source_label());
            Some(UiCommand::Submit(input))
        }
        None => {
            state.info = if state.session.is_running() {
                "Already processing a paper.".into()
            } else {
                match state.session.mode() {
                    Mode::Url => "Enter a paper URL first.".into(),
                    Mode::Upload => "Select a PDF file first.".into(),
                }
            };
            None
        }
    }
}

/// Select the typed path as the upload file. Returns false if it is not a usable file.
fn select_typed_file(state: &mut UiState) -> bool {
    let typed = state.path_input.trim().to_string();
    let path = Path::new(&typed);
    if !path.is_file() {
        state.info = format!("Not a file: {typed}");
        return false;
    }
    if !state.session.select_file(path) {
        return false;
    }
    let is_pdf = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    state.info = if is_pdf {
        format!("Selected {}", typed)
    } else {
        format!("Selected {} (not a .pdf; the backend may reject it)", typed)
    };
    true
}

fn handle_key(state: &mut UiState, k: KeyEvent) -> Option<UiCommand> {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    match k.code {
        KeyCode::Char('c') if ctrl => return Some(UiCommand::Quit),
        KeyCode::Esc => {
            if state.tab == 1 {
                state.tab = 0;
            } else {
                return Some(UiCommand::Quit);
            }
        }
        KeyCode::F(1) => {
            state.tab = if state.tab == 1 { 0 } else { 1 };
        }
        _ if state.tab == 1 => {}
        KeyCode::Tab | KeyCode::BackTab => {
            let next = state.session.mode().toggled();
            if state.session.set_mode(next) {
                state.info = format!("Mode: {}", next.label());
            } else {
                state.info = "Inputs are disabled while processing.".into();
            }
        }
        KeyCode::Enter => {
            if state.session.mode() == Mode::Upload {
                let typed = state.path_input.trim();
                let already_selected = state
                    .session
                    .file_input()
                    .map(|p| p == Path::new(typed))
                    .unwrap_or(false);
                if !typed.is_empty() && !already_selected && !state.session.inputs_disabled() {
                    select_typed_file(state);
                    return None;
                }
            }
            return submit(state);
        }
        KeyCode::Char('r') if ctrl => return submit(state),
        KeyCode::Char('u') if ctrl => {
            state.clear_input();
        }
        KeyCode::Char('y') if ctrl => {
            let text = state.session.results().get(state.focused).to_string();
            if text.is_empty() {
                state.info = format!("{} has nothing to copy yet.", state.focused.title());
            } else {
                state.info = match export::copy_to_clipboard(&text) {
                    Ok(()) => format!("✓ Copied {} to clipboard", state.focused.title()),
                    Err(e) => format!("Clipboard copy failed: {e:#}"),
                };
            }
        }
        KeyCode::Char('s') if ctrl => export::save_and_show_path(state),
        KeyCode::Char(c) if !ctrl => {
            state.push_input_char(c);
        }
        KeyCode::Backspace => {
            state.pop_input_char();
        }
        KeyCode::Left => state.focus_prev(),
        KeyCode::Right => state.focus_next(),
        KeyCode::Up => state.scroll_by(-1),
        KeyCode::Down => state.scroll_by(1),
        KeyCode::PageUp => state.scroll_by(-10),
        KeyCode::PageDown => state.scroll_by(10),
        _ => {}
    }
    None
}

fn apply_event(state: &mut UiState, ev: AnalysisEvent) {
    match ev {
        AnalysisEvent::RunStarted { input } => {
            tracing::debug!(source = %input.source_label(), "run started");
        }
        AnalysisEvent::RunCompleted {
            input,
            outcome,
            elapsed_ms,
        } => {
            state.session.complete(outcome);
            state.run_started = None;
            let processed = orchestrator::process_run_completion(
                state.export_json.as_deref(),
                &input,
                &state.session,
                elapsed_ms,
            );
            let took = humantime::format_duration(Duration::from_secs(elapsed_ms / 1000));
            state.info = match state.session.status() {
                RunStatus::Success if state.session.results().is_empty() => {
                    format!("Analysis complete in {took}, but the backend returned no results")
                }
                RunStatus::Success => format!("Analysis complete in {took}"),
                _ => format!("Analysis failed after {took}"),
            };
            if !processed.export_messages.is_empty() {
                state.info = processed.export_messages.join("; ");
            }
            state.last_record = Some(processed.record);
        }
        AnalysisEvent::Info(msg) => state.info = msg,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Analyze"), Line::from("Help")])
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Research Analysis Engine · Multi-Agent AI for Academic Paper Breakdown"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_analyze(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f, &state.backend_url),
    }
}

fn draw_analyze(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1), // Mode tabs
                Constraint::Length(3), // Input field
                Constraint::Length(1), // Run control
                Constraint::Length(1), // Note
                Constraint::Min(6),    // Result panels
                Constraint::Length(4), // Status
            ]
            .as_ref(),
        )
        .split(area);

    let disabled = state.session.inputs_disabled();
    let mode_idx = match state.session.mode() {
        Mode::Url => 0,
        Mode::Upload => 1,
    };
    let mode_tabs = Tabs::new(vec![
        Line::from(Mode::Url.label()),
        Line::from(Mode::Upload.label()),
    ])
    .select(mode_idx)
    .style(if disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Gray)
    })
    .highlight_style(
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    );
    f.render_widget(mode_tabs, main[0]);

    draw_input(main[1], f, state);
    f.render_widget(Paragraph::new(run_control_line(state)), main[2]);
    f.render_widget(
        Paragraph::new(Span::styled(
            INPUT_NOTE,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center),
        main[3],
    );

    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(main[4]);
    for (agent, rect) in Agent::ALL.into_iter().zip(panels.iter()) {
        draw_slot(*rect, f, state, agent);
    }

    let mut lines = Vec::new();
    push_wrapped_status_kv(
        &mut lines,
        "Status",
        &format!("{:?}", state.session.status()),
        main[5].width,
    );
    push_wrapped_status_kv(&mut lines, "Info", &state.info, main[5].width);
    let status = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Backend {}", state.backend_url)),
    );
    f.render_widget(status, main[5]);
}

fn draw_input(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let disabled = state.session.inputs_disabled();
    let (title, placeholder) = match state.session.mode() {
        Mode::Url => ("Paper URL".to_string(), URL_PLACEHOLDER),
        Mode::Upload => {
            let selected = state
                .session
                .file_input()
                .and_then(|p| p.file_name())
                .map(|n| format!("PDF file (selected: {})", n.to_string_lossy()))
                .unwrap_or_else(|| "PDF file (none selected)".to_string());
            (selected, PATH_PLACEHOLDER)
        }
    };

    let text = state.active_input();
    let content = if text.is_empty() {
        Line::from(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray),
        ))
    } else if disabled {
        Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::raw(text.to_string()),
            Span::styled("▏", Style::default().fg(Color::Blue)),
        ])
    };

    let border = if disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Blue)
    };
    let p = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title),
    );
    f.render_widget(p, area);
}

fn run_control_line(state: &UiState) -> Line<'static> {
    if let Some(started) = state.run_started.filter(|_| state.session.is_running()) {
        let elapsed = humantime::format_duration(Duration::from_secs(started.elapsed().as_secs()));
        return Line::from(vec![
            Span::styled("⟳ Processing Paper... ", Style::default().fg(Color::Yellow)),
            Span::styled(elapsed.to_string(), Style::default().fg(Color::Gray)),
        ]);
    }
    if state.session.run_enabled() {
        Line::from(vec![
            Span::styled(
                "[ Run Analysis ]",
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Enter", Style::default().fg(Color::Magenta)),
        ])
    } else {
        Line::from(Span::styled(
            "[ Run Analysis ]",
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        ))
    }
}

fn draw_slot(area: Rect, f: &mut ratatui::Frame, state: &UiState, agent: Agent) {
    let focused = state.focused == agent;
    if focused {
        state.slot_width.set(area.width.saturating_sub(2));
    }
    let border_type = if focused {
        BorderType::Thick
    } else {
        BorderType::Plain
    };

    match state.session.render_slot(agent) {
        SlotView::Waiting { agent } => {
            let p = Paragraph::new(Span::styled(
                SlotView::placeholder(agent),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(border_type)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
            f.render_widget(p, area);
        }
        SlotView::Ready { agent, content } => {
            let color = agent_color(agent);
            let body_style = if agent == Agent::Practitioner {
                Style::default().fg(Color::White).bg(Color::Rgb(30, 41, 59))
            } else {
                Style::default()
            };

            let mut lines = vec![
                Line::from(Span::styled(
                    agent.description(),
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::ITALIC),
                )),
                Line::from(""),
            ];
            lines.extend(
                content
                    .lines()
                    .map(|l| Line::from(Span::styled(l.to_string(), body_style))),
            );

            let scroll = if focused { state.scroll } else { 0 };
            let p = Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(border_type)
                        .border_style(Style::default().fg(color))
                        .title(Span::styled(
                            agent.title(),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        )),
                );
            f.render_widget(p, area);
        }
    }
}
