//! Scan lifecycle controller.
//!
//! Owns the scan state machine and the progress timer, and emits events for
//! presentation layers.

use crate::address::validate_address;
use crate::engine::progress::{ProgressSimulator, TickOutcome, DEFAULT_STEPS};
use crate::engine::ScanBackend;
use crate::error::ScanError;
use crate::model::{
    CompletedScan, InfoEvent, ProgressStep, ScanConfig, ScanEvent, ScanResult, ScanState,
    StepLabel,
};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, Instant, MissedTickBehavior};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(String),
    Quit,
}

pub(crate) struct ScanController<B> {
    backend: B,
    event_tx: UnboundedSender<ScanEvent>,
    steps: Vec<ProgressStep>,
    tick_interval: Duration,
    step_increment: f64,
    fetch_stats: bool,
    state: ScanState,
    progress: ProgressSimulator,
}

impl<B: ScanBackend> ScanController<B> {
    pub fn new(backend: B, cfg: &ScanConfig, event_tx: UnboundedSender<ScanEvent>) -> Self {
        Self {
            backend,
            event_tx,
            steps: DEFAULT_STEPS.to_vec(),
            // tokio intervals reject a zero period.
            tick_interval: cfg.tick_interval.max(Duration::from_millis(1)),
            step_increment: cfg.step_increment,
            fetch_stats: cfg.fetch_stats,
            state: ScanState::Idle,
            progress: ProgressSimulator::new(&DEFAULT_STEPS, cfg.step_increment),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ScanState {
        self.state
    }

    #[cfg(test)]
    pub fn progress(&self) -> &ProgressSimulator {
        &self.progress
    }

    pub fn event_sender(&self) -> UnboundedSender<ScanEvent> {
        self.event_tx.clone()
    }

    fn emit(&self, ev: ScanEvent) {
        let _ = self.event_tx.send(ev);
    }

    fn set_state(&mut self, state: ScanState) {
        self.state = state;
        self.emit(ScanEvent::StateChanged { state });
    }

    fn fail(&mut self, err: &ScanError) {
        self.set_state(ScanState::Error);
        self.emit(ScanEvent::ScanFailed {
            message: err.to_string(),
        });
    }

    /// Run one scan to settlement.
    ///
    /// Local validation failures return before any request is made. The
    /// progress timer never outlives the request.
    pub async fn submit(&mut self, input: &str) -> Result<CompletedScan, ScanError> {
        if matches!(self.state, ScanState::Complete | ScanState::Error) {
            self.set_state(ScanState::Idle);
        }

        let address = match validate_address(input) {
            Ok(a) => a.to_string(),
            Err(e) => {
                log::debug!("rejected address {input:?}: {e}");
                self.fail(&e);
                return Err(e);
            }
        };

        self.set_state(ScanState::Scanning);
        self.emit(ScanEvent::Info(InfoEvent::ScanStarted {
            address: address.clone(),
        }));
        log::info!("scan started for {address}");

        self.progress = ProgressSimulator::new(&self.steps, self.step_increment);
        self.emit(ScanEvent::ProgressStarted {
            steps: self.steps.iter().map(StepLabel::from).collect(),
        });
        if !self.steps.is_empty() {
            self.emit(ScanEvent::StepStarted { index: 0 });
        }

        let started = Instant::now();
        let outcome = self.race_progress(&address).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) if !result.has_risk_assessment() => {
                let err = ScanError::InvalidResponse(format!(
                    "Invalid response from server: {}",
                    result.raw()
                ));
                log::warn!("scan of {address} returned no risk assessment");
                self.fail(&err);
                // The server still counted this scan.
                self.refresh_stats().await;
                Err(err)
            }
            Ok(result) => {
                self.progress.complete();
                let scan = CompletedScan {
                    address,
                    scanned_at_utc: time::OffsetDateTime::now_utc()
                        .format(&time::format_description::well_known::Rfc3339)
                        .unwrap_or_else(|_| "now".into()),
                    elapsed_ms,
                    result,
                };
                log::info!("scan of {} completed in {elapsed_ms} ms", scan.address);
                self.set_state(ScanState::Complete);
                self.emit(ScanEvent::ScanCompleted {
                    scan: Box::new(scan.clone()),
                });
                self.refresh_stats().await;
                Ok(scan)
            }
            Err(e) => {
                log::info!("scan of {address} failed after {elapsed_ms} ms: {e}");
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Race the request against the progress timer. The timer is dropped on return.
    async fn race_progress(&mut self, address: &str) -> Result<ScanResult, ScanError> {
        let Self {
            backend,
            event_tx,
            progress,
            tick_interval,
            ..
        } = self;

        let request = backend.scan(address);
        tokio::pin!(request);

        let mut timer = tokio::time::interval_at(Instant::now() + *tick_interval, *tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Settlement wins ties so no tick lands after it.
                biased;
                res = &mut request => return res,
                _ = timer.tick(), if !progress.is_finished() => {
                    advance_progress(progress, event_tx);
                }
            }
        }
    }

    /// Best-effort counter refresh; failures are logged only.
    pub async fn refresh_stats(&self) {
        if self.fetch_stats {
            publish_stats(&self.backend, &self.event_tx).await;
        }
    }
}

async fn publish_stats<B: ScanBackend>(backend: &B, event_tx: &UnboundedSender<ScanEvent>) {
    match backend.fetch_stats().await {
        Ok(stats) => {
            let _ = event_tx.send(ScanEvent::StatsUpdated { stats });
        }
        Err(e) => log::warn!("failed to fetch scan stats: {e}"),
    }
}

fn advance_progress(progress: &mut ProgressSimulator, event_tx: &UnboundedSender<ScanEvent>) {
    match progress.tick() {
        TickOutcome::Advanced { percent } => {
            let _ = event_tx.send(ScanEvent::ProgressTick { percent });
        }
        TickOutcome::StepCompleted { index, next } => {
            let _ = event_tx.send(ScanEvent::StepCompleted { index });
            if let Some(next) = next {
                let _ = event_tx.send(ScanEvent::StepStarted { index: next });
            }
        }
        TickOutcome::Finished => {
            let _ = event_tx.send(ScanEvent::ProgressTick { percent: 100.0 });
        }
        TickOutcome::Idle => {}
    }
}

/// Spawn a scan that hands the controller back when it settles.
fn start_scan<B>(
    mut controller: ScanController<B>,
    address: String,
) -> tokio::task::JoinHandle<ScanController<B>>
where
    B: ScanBackend + 'static,
{
    tokio::spawn(async move {
        let _ = controller.submit(&address).await;
        controller
    })
}

/// Serve UI commands, one scan at a time.
///
/// Submissions that arrive while a scan is in flight are ignored with an
/// info event. Quitting aborts the in-flight scan.
pub(crate) async fn run_controller<B>(
    controller: ScanController<B>,
    initial_address: Option<String>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()>
where
    B: ScanBackend + Clone + 'static,
{
    let event_tx = controller.event_sender();
    let controller_fetches_stats = controller.fetch_stats;
    let startup_backend = controller.backend.clone();
    let mut idle = Some(controller);
    let mut in_flight: Option<tokio::task::JoinHandle<ScanController<B>>> = None;

    // Startup counter fetch runs beside the command loop so it never delays a scan.
    if controller_fetches_stats {
        let backend = startup_backend;
        let tx = event_tx.clone();
        tokio::spawn(async move { publish_stats(&backend, &tx).await });
    }
    if let Some(address) = initial_address {
        in_flight = idle.take().map(|c| start_scan(c, address));
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(address)) => {
                        match idle.take() {
                            Some(c) => in_flight = Some(start_scan(c, address)),
                            None => {
                                let _ = event_tx.send(ScanEvent::Info(InfoEvent::ScanAlreadyRunning));
                            }
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        if let Some(h) = in_flight.take() {
                            h.abort();
                        }
                        break Ok(());
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(h) = in_flight.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    in_flight = None;
                    match join_res {
                        Ok(c) => idle = Some(c),
                        Err(e) => break Err(anyhow::anyhow!("scan task failed: {e}")),
                    }
                }
            }
        }
    }
}
