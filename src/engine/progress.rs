//! Cosmetic progress model.
//!
//! Advances a percentage toward per-step targets one tick at a time. It knows
//! nothing about the request it decorates; the controller drives it from a
//! timer and drops it when the request settles.

use crate::model::{ProgressStep, StepStatus};
use std::time::Duration;

const fn step(label: &'static str, ms: u64, icon: &'static str) -> ProgressStep {
    ProgressStep {
        label,
        nominal_duration: Duration::from_millis(ms),
        icon,
    }
}

pub const DEFAULT_STEPS: [ProgressStep; 8] = [
    step("Fetching token data...", 3000, "[>]"),
    step("Analyzing liquidity & market cap...", 3500, "[$]"),
    step("Checking mint/freeze authority...", 2500, "[#]"),
    step("Analyzing holder distribution...", 4000, "[*]"),
    step("Detecting snipers & insider trading...", 3500, "[^]"),
    step("Checking for wash trading...", 3000, "[=]"),
    step("Analyzing pump & dump patterns...", 3000, "[~]"),
    step("Calculating risk score...", 2500, "[!]"),
];

pub const DEFAULT_INCREMENT: f64 = 1.2;

/// What a single tick changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Percentage moved toward the current step's target.
    Advanced { percent: f64 },
    /// The current step was completed; `next` is now active, if any.
    StepCompleted { index: usize, next: Option<usize> },
    /// All steps are done and the bar is pinned at 100.
    Finished,
    /// Ticking after completion; nothing changes.
    Idle,
}

#[derive(Debug, Clone)]
pub struct ProgressSimulator {
    steps: Vec<ProgressStep>,
    statuses: Vec<StepStatus>,
    current: usize,
    percent: f64,
    increment: f64,
    finished: bool,
}

impl ProgressSimulator {
    pub fn new(steps: &[ProgressStep], increment: f64) -> Self {
        let mut statuses = vec![StepStatus::Pending; steps.len()];
        if let Some(first) = statuses.first_mut() {
            *first = StepStatus::Active;
        }
        Self {
            steps: steps.to_vec(),
            statuses,
            current: 0,
            percent: 0.0,
            // A non-positive increment would stall the bar forever.
            increment: if increment > 0.0 { increment } else { DEFAULT_INCREMENT },
            finished: false,
        }
    }

    #[cfg(test)]
    pub fn statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    #[cfg(test)]
    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn target_for(&self, index: usize) -> f64 {
        let per_step = 100.0 / self.steps.len() as f64;
        ((index + 1) as f64 * per_step).min(100.0)
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.finished {
            return TickOutcome::Idle;
        }
        if self.current >= self.steps.len() {
            self.percent = 100.0;
            self.finished = true;
            return TickOutcome::Finished;
        }

        let target = self.target_for(self.current);
        if self.percent < target {
            self.percent = (self.percent + self.increment).min(target);
            return TickOutcome::Advanced {
                percent: self.percent,
            };
        }

        let index = self.current;
        self.statuses[index] = StepStatus::Completed;
        self.current += 1;
        let next = if self.current < self.steps.len() {
            self.statuses[self.current] = StepStatus::Active;
            Some(self.current)
        } else {
            None
        };
        TickOutcome::StepCompleted { index, next }
    }

    /// Jump to 100% once the real work is done.
    pub fn complete(&mut self) {
        for s in &mut self.statuses {
            *s = StepStatus::Completed;
        }
        self.current = self.steps.len();
        self.percent = 100.0;
        self.finished = true;
    }
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::new(&DEFAULT_STEPS, DEFAULT_INCREMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(sim: &mut ProgressSimulator) -> Vec<TickOutcome> {
        let mut out = Vec::new();
        for _ in 0..10_000 {
            let o = sim.tick();
            out.push(o);
            if o == TickOutcome::Finished {
                break;
            }
        }
        out
    }

    #[test]
    fn first_step_active_on_start() {
        let sim = ProgressSimulator::default();
        assert_eq!(sim.statuses()[0], StepStatus::Active);
        assert!(sim.statuses()[1..]
            .iter()
            .all(|s| *s == StepStatus::Pending));
        assert_eq!(sim.percent(), 0.0);
    }

    #[test]
    fn percent_is_monotonic_and_capped() {
        let mut sim = ProgressSimulator::default();
        let mut last = sim.percent();
        for _ in 0..2_000 {
            sim.tick();
            assert!(sim.percent() >= last);
            assert!(sim.percent() <= 100.0);
            last = sim.percent();
        }
        assert!(sim.is_finished());
        assert_eq!(sim.percent(), 100.0);
    }

    #[test]
    fn clamps_to_step_target() {
        let mut sim = ProgressSimulator::default();
        // 12.5 / 1.2 -> ten increments, the last one clamped.
        for _ in 0..10 {
            sim.tick();
        }
        assert!(sim.percent() > 11.9 && sim.percent() < 12.5);
        assert_eq!(sim.tick(), TickOutcome::Advanced { percent: 12.5 });
        assert_eq!(
            sim.tick(),
            TickOutcome::StepCompleted {
                index: 0,
                next: Some(1)
            }
        );
        assert_eq!(sim.statuses()[0], StepStatus::Completed);
        assert_eq!(sim.statuses()[1], StepStatus::Active);
    }

    #[test]
    fn steps_complete_in_order_then_finish() {
        let mut sim = ProgressSimulator::default();
        let outcomes = run_to_end(&mut sim);
        let completed: Vec<usize> = outcomes
            .iter()
            .filter_map(|o| match o {
                TickOutcome::StepCompleted { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(completed, (0..8).collect::<Vec<_>>());
        assert_eq!(outcomes.last(), Some(&TickOutcome::Finished));
        assert_eq!(sim.tick(), TickOutcome::Idle);
        assert!(sim
            .statuses()
            .iter()
            .all(|s| *s == StepStatus::Completed));
    }

    #[test]
    fn complete_jumps_to_full() {
        let mut sim = ProgressSimulator::default();
        sim.tick();
        sim.complete();
        assert_eq!(sim.percent(), 100.0);
        assert!(sim.is_finished());
        assert_eq!(sim.tick(), TickOutcome::Idle);
    }

    #[test]
    fn non_positive_increment_falls_back() {
        let mut sim = ProgressSimulator::new(&DEFAULT_STEPS, 0.0);
        sim.tick();
        assert!(sim.percent() > 0.0);
    }
}
