use crate::engine::ScanApiClient;
use crate::model::{ScanConfig, ScanEvent, ScanMethod, StepLabel};
use crate::orchestrator::ScanController;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
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
    name = "token-scan-cli",
    version,
    about = "Solana token risk scanner client with optional TUI"
)]
pub struct Cli {
    /// Token mint address to scan (pre-fills the TUI input and scans at launch)
    pub address: Option<String>,

    /// Base URL of the scanner service
    #[arg(long, default_value = "http://localhost:5000")]
    pub base_url: String,

    /// How to issue the scan request
    #[arg(long, value_enum, default_value_t = ScanMethod::Post)]
    pub method: ScanMethod,

    /// Print the raw JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text report and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Request timeout
    #[arg(long, default_value = "120s")]
    pub timeout: humantime::Duration,

    /// Progress animation tick period
    #[arg(long, default_value = "100ms")]
    pub tick: humantime::Duration,

    /// Progress percentage points added per tick
    #[arg(long, default_value_t = 1.2)]
    pub step_increment: f64,

    /// Skip the scan counter fetch after a scan
    #[arg(long)]
    pub no_stats: bool,
}

impl Cli {
    /// Whether the interactive UI will run for these arguments.
    pub fn is_interactive(&self) -> bool {
        !(self.silent || self.json || self.text)
    }

    /// Log filter used when `RUST_LOG` is unset. The TUI owns the terminal,
    /// and `--silent` leaves stderr to errors only.
    pub fn default_log_filter(&self) -> &'static str {
        if self.silent {
            "error"
        } else if self.is_interactive() {
            "off"
        } else {
            "warn"
        }
    }
}

/// Build a `ScanConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ScanConfig {
    ScanConfig {
        base_url: args.base_url.clone(),
        method: args.method,
        request_timeout: Duration::from(args.timeout),
        tick_interval: Duration::from(args.tick),
        step_increment: args.step_increment,
        fetch_stats: !args.no_stats,
        user_agent: format!("token-scan-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

fn required_address(args: &Cli) -> Result<String> {
    args.address
        .clone()
        .context("a token address is required with --json or --text")
}

/// Scan once and print the raw payload.
async fn run_json(args: Cli) -> Result<()> {
    let address = required_address(&args)?;
    let cfg = build_config(&args);
    let client = ScanApiClient::new(&cfg)?;
    // Nothing renders progress in this mode.
    let (evt_tx, _) = mpsc::unbounded_channel::<ScanEvent>();
    let mut controller = ScanController::new(client, &cfg, evt_tx);

    let scan = controller
        .submit(&address)
        .await
        .map_err(|e| anyhow::anyhow!("[X] Error: {e}"))?;

    if !args.silent {
        let (out_tx, out_handle) = spawn_output_writer();
        let out = serde_json::to_string_pretty(scan.result.raw())?;
        let _ = out_tx.send(OutputLine::Stdout(out));
        drop(out_tx);
        let _ = out_handle.await;
    }
    Ok(())
}

async fn run_text(args: Cli) -> Result<()> {
    let address = required_address(&args)?;
    let cfg = build_config(&args);
    let client = ScanApiClient::new(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ScanEvent>();

    let mut controller = ScanController::new(client, &cfg, evt_tx);
    let handle = tokio::spawn(async move { controller.submit(&address).await });

    let mut steps: Vec<StepLabel> = Vec::new();
    let mut percent = 0.0;
    while let Some(ev) = evt_rx.recv().await {
        match ev {
            ScanEvent::ProgressStarted { steps: s } => steps = s,
            ScanEvent::ProgressTick { percent: p } => percent = p,
            ScanEvent::StepStarted { index } => {
                if let Some(step) = steps.get(index) {
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "{} {} ({percent:.0}%)",
                        step.icon, step.label
                    )));
                }
            }
            ScanEvent::StepCompleted { .. } => {}
            ScanEvent::StateChanged { state } => {
                log::debug!("state: {}", state.label());
            }
            ScanEvent::Info(info) => {
                let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
            }
            ScanEvent::ScanCompleted { scan } => {
                let summary = crate::text_summary::build_text_summary(&scan);
                for line in summary.lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
            }
            ScanEvent::ScanFailed { .. } => {}
            ScanEvent::StatsUpdated { stats } => {
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "Total scans: {}",
                    stats.total_scans
                )));
            }
        }
    }

    let outcome = handle.await.context("scan task failed")?;
    drop(out_tx);
    let _ = out_handle.await;
    outcome.map_err(|e| anyhow::anyhow!("[X] Error: {e}"))?;
    Ok(())
}
