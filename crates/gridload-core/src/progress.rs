//! Progress reporting for long-running stages.
//!
//! Stages receive a `&dyn ProgressSink` and report when they start, when
//! they finish, and how far through their input they are. What happens with
//! those events is up to the caller: the CLI logs them through `tracing`,
//! tests pass [`NullProgress`].

use std::sync::Mutex;

use tracing::info;
use web_time::Instant;

/// Receiver for stage lifecycle and progress events.
pub trait ProgressSink: Send + Sync {
    fn stage_started(&self, stage: &str);

    fn stage_finished(&self, stage: &str);

    /// `done` out of `total` units of work have been processed.
    fn advance(&self, stage: &str, done: usize, total: usize);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn stage_started(&self, _stage: &str) {}

    fn stage_finished(&self, _stage: &str) {}

    fn advance(&self, _stage: &str, _done: usize, _total: usize) {}
}

/// Logs stage timings and throttled percentage updates through `tracing`.
#[derive(Debug)]
pub struct TracingProgress {
    /// Emit an `advance` line every `step_pct` percent.
    step_pct: usize,
    state: Mutex<ProgressState>,
}

#[derive(Debug, Default)]
struct ProgressState {
    started: Vec<(String, Instant)>,
    last_pct: Option<usize>,
}

impl TracingProgress {
    pub fn new(step_pct: usize) -> Self {
        Self {
            step_pct: step_pct.clamp(1, 100),
            state: Mutex::new(ProgressState::default()),
        }
    }
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressSink for TracingProgress {
    fn stage_started(&self, stage: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.started.push((stage.to_string(), Instant::now()));
            state.last_pct = None;
        }
        info!(stage = stage, "stage started");
    }

    fn stage_finished(&self, stage: &str) {
        let elapsed_ms = self.state.lock().ok().and_then(|mut state| {
            let pos = state.started.iter().rposition(|(name, _)| name == stage)?;
            let (_, start) = state.started.remove(pos);
            Some(start.elapsed().as_millis())
        });
        match elapsed_ms {
            Some(ms) => info!(stage = stage, elapsed_ms = ms as u64, "stage finished"),
            None => info!(stage = stage, "stage finished"),
        }
    }

    fn advance(&self, stage: &str, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let pct = done.min(total) * 100 / total;
        let bucket = pct / self.step_pct;
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.last_pct == Some(bucket) {
            return;
        }
        state.last_pct = Some(bucket);
        info!(stage = stage, done = done, total = total, "{}% complete", pct);
    }
}
