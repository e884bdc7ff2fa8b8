mod clipboard;
mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::engine::ScanApiClient;
use crate::model::{ScanEvent, ScanState};
use crate::orchestrator::{self, ScanController, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ScanEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let cfg = build_config(&args);
    let client = ScanApiClient::new(&cfg)?;
    let controller = ScanController::new(client, &cfg, event_tx);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let initial_input = args.address.clone().unwrap_or_default();
    let ui_handle = std::thread::spawn(move || run_threaded(initial_input, event_rx, cmd_tx));

    let res = orchestrator::run_controller(controller, args.address.clone(), cmd_rx).await;

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

/// Rows available to the report body for a given terminal height.
fn report_rows(height: u16) -> usize {
    // header + input + footer + borders
    height.saturating_sub(3 + 3 + 1 + 2) as usize
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    initial_input: String,
    mut event_rx: UnboundedReceiver<ScanEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        input: initial_input,
        info: "Enter a token mint address and press Enter (F1 for help)".into(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let page = terminal
            .size()
            .map(|s| report_rows(s.height))
            .unwrap_or(10)
            .max(1);
        match event::read() {
            Ok(Event::Paste(text)) => {
                state.input.push_str(text.trim());
            }
            Ok(Event::Key(k)) => {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('c'))
                    | (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('y')) => {
                        match state.last_scan.as_ref() {
                            Some(scan) => {
                                let address = scan
                                    .result
                                    .mint_address()
                                    .unwrap_or(scan.address.as_str())
                                    .to_string();
                                state.info = match clipboard::copy_to_clipboard(&address) {
                                    Ok(()) => format!("✓ Copied to clipboard: {address}"),
                                    Err(e) => format!("Clipboard copy failed: {e:#}"),
                                };
                            }
                            None => state.info = "No completed scan to copy yet.".into(),
                        }
                    }
                    (_, KeyCode::F(1)) => state.show_help = !state.show_help,
                    (_, KeyCode::Enter) => {
                        state.show_help = false;
                        let _ = cmd_tx.send(UiCommand::Submit(state.input.clone()));
                    }
                    (_, KeyCode::Esc) => {
                        if state.show_help {
                            state.show_help = false;
                        } else {
                            state.input.clear();
                        }
                    }
                    (_, KeyCode::Backspace) => {
                        state.input.pop();
                    }
                    (_, KeyCode::Up) => state.scroll_report(-1, page),
                    (_, KeyCode::Down) => state.scroll_report(1, page),
                    (_, KeyCode::PageUp) => state.scroll_report(-(page as isize), page),
                    (_, KeyCode::PageDown) => state.scroll_report(page as isize, page),
                    (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                        if c == '?' && state.input.is_empty() {
                            state.show_help = !state.show_help;
                        } else {
                            state.input.push(c);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    draw_header(chunks[0], f, state);
    draw_input(chunks[1], f, state);

    if state.show_help {
        help::draw_help(chunks[2], f);
    } else {
        match state.scan_state {
            ScanState::Scanning => draw_progress(chunks[2], f, state),
            ScanState::Complete => draw_report(chunks[2], f, state),
            ScanState::Error => draw_error(chunks[2], f, state),
            ScanState::Idle => draw_idle(chunks[2], f),
        }
    }

    let footer = Paragraph::new(Line::from(Span::styled(
        state.info.clone(),
        Style::default().fg(Color::Gray),
    )));
    f.render_widget(footer, chunks[3]);
}

fn draw_header(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let scans = state
        .total_scans
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".into());
    let mut spans = vec![
        Span::styled("Status: ", Style::default().fg(Color::Gray)),
        state.status_span(),
        Span::raw("   "),
        Span::styled("Total scans: ", Style::default().fg(Color::Gray)),
        Span::raw(scans),
    ];
    if let Some(ml) = state.ml_enabled {
        spans.push(Span::raw("   "));
        spans.push(Span::styled("ML: ", Style::default().fg(Color::Gray)));
        spans.push(Span::raw(if ml { "on" } else { "off" }));
    }
    let p = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("token-scan-cli"),
    );
    f.render_widget(p, area);
}

fn draw_input(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = vec![Span::raw(state.input.clone())];
    if !state.scan_state.is_scanning() {
        spans.push(Span::styled("█", Style::default().fg(Color::Gray)));
    }
    let border = if state.scan_state.is_scanning() {
        Color::DarkGray
    } else {
        Color::Cyan
    };
    let p = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title("Token mint address"),
    );
    f.render_widget(p, area);
}

fn draw_progress(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Scanning"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((state.percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", state.percent));
    f.render_widget(gauge, chunks[0]);

    let steps = Paragraph::new(state.step_lines())
        .block(Block::default().borders(Borders::ALL).title("Steps"));
    f.render_widget(steps, chunks[1]);
}

fn draw_report(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let lines: Vec<Line> = state
        .report
        .iter()
        .map(|l| {
            // Section titles start with a bracketed tag.
            if l.starts_with('[') {
                Line::from(Span::styled(
                    l.clone(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(l.clone())
            }
        })
        .collect();
    let title = state
        .last_scan
        .as_ref()
        .and_then(|s| {
            let level = s.result.risk_level()?;
            let score = s.result.safety_score()?;
            Some(format!("Report - {level} ({score:.0}/100)"))
        })
        .unwrap_or_else(|| "Report".into());
    let p = Paragraph::new(lines)
        .scroll((state.report_scroll.min(u16::MAX as usize) as u16, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_error(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let msg = state.error.as_deref().unwrap_or("Scan failed");
    let p = Paragraph::new(Line::from(Span::styled(
        format!("[X] Error: {msg}"),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )))
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title("Error"));
    f.render_widget(p, area);
}

fn draw_idle(area: Rect, f: &mut ratatui::Frame) {
    let p = Paragraph::new(vec![
        Line::from("Paste a Solana token mint address above and press Enter."),
        Line::from(""),
        Line::from(Span::styled(
            "The scanner checks liquidity, authorities, holders, snipers, volume and pump & dump patterns.",
            Style::default().fg(Color::Gray),
        )),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title("Ready"));
    f.render_widget(p, area);
}
