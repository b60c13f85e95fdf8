//! Timing helpers for simulation steps.
//!
//! Provides an RAII profiling scope and a running step timer.

use std::time::Instant;

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is reported at `trace` level when the scope is dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    /// Creates a new profiling scope.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Gets elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        tracing::trace!(scope = self.name, elapsed_ms = self.elapsed_ms(), "scope finished");
    }
}

/// Running timer over simulation steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepTimer {
    last_step_ms: f64,
    total_ms: f64,
    samples: u64,
}

impl StepTimer {
    /// Creates a new step timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one step duration in milliseconds.
    pub fn record(&mut self, time_ms: f64) {
        self.last_step_ms = time_ms;
        self.total_ms += time_ms;
        self.samples += 1;
    }

    /// Gets the last recorded step time.
    pub fn last_step_ms(&self) -> f64 {
        self.last_step_ms
    }

    /// Mean over every recorded step, 0 before the first sample.
    pub fn mean_step_ms(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_ms / self.samples as f64
        }
    }
}
