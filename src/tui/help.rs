use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind("Enter", 8, "Scan the entered address"),
        keybind("Esc", 10, "Clear input / close help"),
        keybind("↑/↓", 10, "Scroll report"),
        keybind("PgUp/PgDn", 4, "Scroll report by page"),
        keybind("Ctrl-Y", 7, "Copy scanned contract address"),
        keybind("F1", 11, "Toggle this help (or ? with empty input)"),
        keybind("Ctrl-C", 7, "Quit (also Ctrl-Q)"),
        Line::from(""),
        Line::from("Addresses must be 32-44 characters; they are checked before"),
        Line::from("anything is sent to the scanner service."),
        Line::from(""),
        Line::from(vec![
            Span::raw("Progress steps are cosmetic; "),
            Span::styled(
                "the scan finishes when the server answers.",
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
