use crate::model::{Agent, AnalysisRecord, Mode};
use crate::session::AnalysisSession;
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};
use std::cell::Cell;
use std::path::PathBuf;
use std::time::Instant;

pub struct UiState {
    pub tab: usize,
    pub session: AnalysisSession,
    pub backend_url: String,
    // Upload mode path being typed; becomes the selected file on Enter.
    pub path_input: String,
    pub info: String,
    pub focused: Agent,
    pub scroll: u16,
    // Inner width of the last drawn result panel, for the scroll limit.
    pub slot_width: Cell<u16>,
    pub run_started: Option<Instant>,
    pub last_record: Option<AnalysisRecord>,
    pub export_json: Option<PathBuf>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            session: AnalysisSession::new(),
            backend_url: crate::model::DEFAULT_BASE_URL.to_string(),
            path_input: String::new(),
            info: String::new(),
            focused: Agent::Explicator,
            scroll: 0,
            slot_width: Cell::new(0),
            run_started: None,
            last_record: None,
            export_json: None,
        }
    }
}

/// Accent color per agent.
pub fn agent_color(agent: Agent) -> Color {
    match agent {
        Agent::Explicator => Color::Rgb(217, 119, 6),
        Agent::Visionary => Color::Rgb(124, 58, 237),
        Agent::Practitioner => Color::Rgb(5, 150, 105),
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}

impl UiState {
    /// Text of the active input field.
    pub fn active_input(&self) -> &str {
        match self.session.mode() {
            Mode::Url => self.session.url_input(),
            Mode::Upload => &self.path_input,
        }
    }

    pub fn push_input_char(&mut self, c: char) -> bool {
        match self.session.mode() {
            Mode::Url => match self.session.url_input_mut() {
                Some(url) => {
                    url.push(c);
                    true
                }
                None => false,
            },
            Mode::Upload if !self.session.inputs_disabled() => {
                // An edited path no longer names the selected file.
                self.session.clear_file();
                self.path_input.push(c);
                true
            }
            Mode::Upload => false,
        }
    }

    pub fn pop_input_char(&mut self) -> bool {
        match self.session.mode() {
            Mode::Url => match self.session.url_input_mut() {
                Some(url) => url.pop().is_some(),
                None => false,
            },
            Mode::Upload if !self.session.inputs_disabled() => {
                let popped = self.path_input.pop().is_some();
                if popped {
                    self.session.clear_file();
                }
                popped
            }
            Mode::Upload => false,
        }
    }

    /// Clear the active input; in upload mode this also drops the selected file.
    pub fn clear_input(&mut self) -> bool {
        match self.session.mode() {
            Mode::Url => self.session.set_url_input(String::new()),
            Mode::Upload => {
                if self.session.clear_file() {
                    self.path_input.clear();
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn focus_next(&mut self) {
        self.focused = match self.focused {
            Agent::Explicator => Agent::Visionary,
            Agent::Visionary => Agent::Practitioner,
            Agent::Practitioner => Agent::Explicator,
        };
        self.scroll = 0;
    }

    pub fn focus_prev(&mut self) {
        self.focused = match self.focused {
            Agent::Explicator => Agent::Practitioner,
            Agent::Visionary => Agent::Explicator,
            Agent::Practitioner => Agent::Visionary,
        };
        self.scroll = 0;
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let agent = self.focused;
        let width = self.slot_width.get();
        let rows = wrapped_rows(agent.description(), width)
            + 1
            + wrapped_rows(self.session.results().get(agent), width);
        let max = rows.saturating_sub(1).min(u16::MAX as usize) as i32;
        let next = (self.scroll as i32 + delta).clamp(0, max);
        self.scroll = next as u16;
    }
}

/// Rows `text` takes when wrapped at `width` columns; width 0 means not laid out yet.
fn wrapped_rows(text: &str, width: u16) -> usize {
    let width = width.max(1) as usize;
    text.lines()
        .map(|line| line.chars().count().div_ceil(width).max(1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResultSet;
    use pretty_assertions::assert_eq;

    fn with_explicator(text: &str) -> UiState {
        let mut state = UiState::default();
        state.session.set_url_input("https://x.org");
        state.session.submit_analysis().unwrap();
        state.session.complete(Ok(ResultSet {
            explicator: text.into(),
            ..ResultSet::default()
        }));
        state
    }

    #[test]
    fn long_single_line_result_scrolls_through_wrapped_rows() {
        let mut state = with_explicator(&"word ".repeat(200));
        state.slot_width.set(40);

        state.scroll_by(10);
        assert_eq!(state.scroll, 10);
        state.scroll_by(1000);
        // 2 description rows + blank + 25 content rows, last row stays visible.
        assert_eq!(state.scroll, 27);
        state.scroll_by(-1000);
        assert_eq!(state.scroll, 0);
    }

    #[test]
    fn wrapped_rows_counts_blank_lines() {
        assert_eq!(wrapped_rows("abcdef\n\nxy", 3), 4);
        assert_eq!(wrapped_rows("", 10), 0);
    }

    #[test]
    fn editing_path_drops_selected_file() {
        let mut state = UiState::default();
        state.session.set_mode(Mode::Upload);
        state.session.select_file("/tmp/a.pdf");
        state.path_input = "/tmp/a.pdf".into();

        assert!(state.push_input_char('x'));
        assert!(state.session.file_input().is_none());
        assert!(!state.session.run_enabled());
    }
}
