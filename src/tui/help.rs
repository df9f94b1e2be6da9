use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, backend_url: &str) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Esc", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("Tab", 9, "Switch between link and PDF upload"),
        key_line("Enter", 7, "Select typed PDF path / Run analysis"),
        key_line("Ctrl-R", 6, "Run analysis"),
        key_line("Ctrl-U", 6, "Clear input"),
        key_line("←/→", 9, "Focus previous/next result"),
        key_line("↑/↓", 9, "Scroll focused result"),
        key_line("PgUp/PgDn", 3, "Scroll focused result by a page"),
        key_line("Ctrl-Y", 6, "Copy focused result to clipboard"),
        key_line("Ctrl-S", 6, "Save last run as JSON"),
        key_line("F1", 10, "Toggle this help"),
        Line::from(""),
        Line::from("Agents:"),
        Line::from("  The Explicator    Explains the core concepts and methodology."),
        Line::from("  The Visionary     Proposes future research and applications."),
        Line::from("  The Practitioner  Provides implementation logic/code."),
        Line::from(""),
        Line::from("Backend:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(backend_url.to_string(), Style::default().fg(Color::Cyan)),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
