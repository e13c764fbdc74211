//! Per-stage start/complete/error reporting with timing.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{AgentError, Result};

/// Short human-readable description of a stage's output.
pub trait StepSummary {
    fn step_summary(&self) -> String;
}

/// Hooks run around one pipeline stage.
pub trait StepReporter<T> {
    fn start(&self) {}

    fn complete(&self, result: &T, elapsed: Duration);

    fn error(&self, error: &AgentError, elapsed: Duration);
}

/// Logs a numbered stage of a named pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    pub pipeline: &'static str,
    pub step: u8,
    pub total: u8,
    pub title: &'static str,
}

impl Stage {
    pub const fn new(pipeline: &'static str, step: u8, total: u8, title: &'static str) -> Self {
        Self {
            pipeline,
            step,
            total,
            title,
        }
    }
}

impl<T: StepSummary> StepReporter<T> for Stage {
    fn start(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            step = self.step,
            total = self.total,
            "Step {}/{}: {}...",
            self.step,
            self.total,
            self.title
        );
    }

    fn complete(&self, result: &T, elapsed: Duration) {
        tracing::info!(
            pipeline = self.pipeline,
            step = self.step,
            elapsed_ms = elapsed.as_millis() as u64,
            "Step {}/{} complete: {}",
            self.step,
            self.total,
            result.step_summary()
        );
    }

    fn error(&self, error: &AgentError, elapsed: Duration) {
        tracing::error!(
            pipeline = self.pipeline,
            step = self.step,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error,
            "Step {}/{} failed",
            self.step,
            self.total
        );
    }
}

/// Await `stage`, reporting around it. The outcome is returned unchanged.
pub async fn run_step<T, R, F>(reporter: &R, stage: F) -> Result<T>
where
    R: StepReporter<T> + ?Sized,
    F: Future<Output = Result<T>>,
{
    reporter.start();
    let started = Instant::now();
    let outcome = stage.await;
    match &outcome {
        Ok(value) => reporter.complete(value, started.elapsed()),
        Err(e) => reporter.error(e, started.elapsed()),
    }
    outcome
}
