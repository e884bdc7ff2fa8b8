use crate::model::{CompletedScan, ScanEvent, ScanState, StepLabel, StepStatus};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub struct UiState {
    pub scan_state: ScanState,
    pub input: String,
    pub info: String,
    pub show_help: bool,

    // Progress of the running scan
    pub steps: Vec<StepLabel>,
    pub step_statuses: Vec<StepStatus>,
    pub percent: f64,

    pub last_scan: Option<CompletedScan>,
    pub report: Vec<String>,
    pub report_scroll: usize,
    pub error: Option<String>,

    pub total_scans: Option<u64>,
    pub ml_enabled: Option<bool>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            scan_state: ScanState::Idle,
            input: String::new(),
            info: String::new(),
            show_help: false,
            steps: Vec::new(),
            step_statuses: Vec::new(),
            percent: 0.0,
            last_scan: None,
            report: Vec::new(),
            report_scroll: 0,
            error: None,
            total_scans: None,
            ml_enabled: None,
        }
    }
}

impl UiState {
    pub fn apply_event(&mut self, ev: ScanEvent) {
        match ev {
            ScanEvent::StateChanged { state } => {
                self.scan_state = state;
                if state == ScanState::Scanning {
                    // Hide the previous outcome while a new scan runs.
                    self.error = None;
                    self.report.clear();
                    self.report_scroll = 0;
                    self.last_scan = None;
                    self.percent = 0.0;
                }
            }
            ScanEvent::ProgressStarted { steps } => {
                self.step_statuses = vec![StepStatus::Pending; steps.len()];
                self.steps = steps;
                self.percent = 0.0;
            }
            ScanEvent::ProgressTick { percent } => {
                // Ticks only move forward.
                self.percent = self.percent.max(percent.min(100.0));
            }
            ScanEvent::StepStarted { index } => {
                if let Some(s) = self.step_statuses.get_mut(index) {
                    *s = StepStatus::Active;
                }
            }
            ScanEvent::StepCompleted { index } => {
                if let Some(s) = self.step_statuses.get_mut(index) {
                    *s = StepStatus::Completed;
                }
            }
            ScanEvent::Info(info) => {
                self.info = info.to_message();
            }
            ScanEvent::ScanCompleted { scan } => {
                self.percent = 100.0;
                for s in &mut self.step_statuses {
                    *s = StepStatus::Completed;
                }
                self.report = crate::text_summary::build_text_summary(&scan).lines;
                self.report_scroll = 0;
                self.info = format!(
                    "Scan finished in {:.1}s (Ctrl-Y copies the contract address)",
                    scan.elapsed_ms as f64 / 1000.0
                );
                self.last_scan = Some(*scan);
            }
            ScanEvent::ScanFailed { message } => {
                // Nothing from an earlier scan stays copyable.
                self.report.clear();
                self.report_scroll = 0;
                self.last_scan = None;
                self.error = Some(message);
            }
            ScanEvent::StatsUpdated { stats } => {
                self.total_scans = Some(stats.total_scans);
                self.ml_enabled = stats.ml_enabled.or(self.ml_enabled);
            }
        }
    }

    pub fn scroll_report(&mut self, delta: isize, visible: usize) {
        let max = self.report.len().saturating_sub(visible);
        let next = self.report_scroll as isize + delta;
        self.report_scroll = next.clamp(0, max as isize) as usize;
    }

    pub fn status_span(&self) -> Span<'static> {
        let color = match self.scan_state {
            ScanState::Idle => Color::Green,
            ScanState::Scanning => Color::Yellow,
            ScanState::Complete => Color::Cyan,
            ScanState::Error => Color::Red,
        };
        Span::styled(
            self.scan_state.label(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    }

    pub fn step_lines(&self) -> Vec<Line<'static>> {
        self.steps
            .iter()
            .zip(&self.step_statuses)
            .map(|(step, status)| {
                let (marker, style) = match status {
                    StepStatus::Pending => ("   ", Style::default().fg(Color::DarkGray)),
                    StepStatus::Active => (
                        " > ",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    StepStatus::Completed => (" ✓ ", Style::default().fg(Color::Green)),
                };
                Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(format!("{} ", step.icon), style),
                    Span::styled(step.label.clone(), style),
                    Span::styled(
                        format!("  ~{:.1}s", step.nominal_ms as f64 / 1000.0),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    }
}
