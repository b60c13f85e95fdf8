//! Bounded stepping loop for callers that render between steps
//!
//! The engine itself has no notion of "done". Front-ends usually step a fixed
//! number of times and stop early once the plume has dissipated; `Playback`
//! packages that loop so every front-end applies the same rule.

use super::DiffusionGridEngine;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::debug;

/// Default upper bound on steps per playback
pub const DEFAULT_MAX_STEPS: u32 = 200;
/// Steps that always run before the quiescence check is consulted
pub const DEFAULT_MIN_STEPS: u32 = 5;
/// Field maximum below which the air counts as clean
pub const DEFAULT_QUIESCENCE_THRESHOLD: f32 = 1e-4;

/// Termination rule for a playback run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackPolicy {
    pub max_steps: u32,
    pub min_steps: u32,
    pub quiescence_threshold: f32,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            min_steps: DEFAULT_MIN_STEPS,
            quiescence_threshold: DEFAULT_QUIESCENCE_THRESHOLD,
        }
    }
}

/// Why a playback run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// `max_steps` updates ran
    Completed,
    /// The field maximum dropped below the threshold
    Quiescent,
    /// The frame callback asked to stop
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSummary {
    pub steps_run: u32,
    pub stop_reason: StopReason,
}

/// Runs [`DiffusionGridEngine::update`] under a [`PlaybackPolicy`]
pub struct Playback;

impl Playback {
    /// Step `engine` until the policy says stop.
    ///
    /// `on_frame` receives the zero-based step index and the engine after each
    /// update, including the update that triggers a quiescent stop. Returning
    /// `ControlFlow::Break(())` ends the run after that frame.
    pub fn run<F>(
        engine: &mut DiffusionGridEngine,
        policy: &PlaybackPolicy,
        mut on_frame: F,
    ) -> PlaybackSummary
    where
        F: FnMut(u32, &DiffusionGridEngine) -> ControlFlow<()>,
    {
        for step in 0..policy.max_steps {
            engine.update();

            if on_frame(step, engine).is_break() {
                debug!("Playback cancelled after step {step}");
                return PlaybackSummary {
                    steps_run: step + 1,
                    stop_reason: StopReason::Cancelled,
                };
            }

            if step > policy.min_steps && engine.max_concentration() < policy.quiescence_threshold
            {
                debug!(
                    "Playback quiescent at step {step}: max={:e}",
                    engine.max_concentration()
                );
                return PlaybackSummary {
                    steps_run: step + 1,
                    stop_reason: StopReason::Quiescent,
                };
            }
        }

        PlaybackSummary {
            steps_run: policy.max_steps,
            stop_reason: StopReason::Completed,
        }
    }
}
