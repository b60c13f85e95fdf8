//! Contaminant diffusion engine
//!
//! `DiffusionGridEngine` owns the concentration field and the obstacle mask
//! and advances them one discrete step at a time:
//! - Von Neumann neighbor averaging with an absorbing boundary
//! - Uniform multiplicative decay
//! - Impermeable obstacles forced to zero every step
//!
//! Stepping is synchronous. Pacing, cancellation and rendering belong to the
//! caller; [`playback`] offers the usual bounded loop.

pub mod config;
pub mod playback;
pub mod scenario;

pub use config::{EngineConfig, EngineError};
pub use playback::{Playback, PlaybackPolicy, PlaybackSummary, StopReason};
pub use scenario::{EmissionSource, MapPreset, ScenarioError};

use crate::grid::{CellRect, FieldData, ObstacleMask};
use crate::solver::{step_diffusion_cpu, DiffusionParams, ProfilerScope, StepTimer, SweepMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// Concentration written by [`DiffusionGridEngine::emit_default`]
pub const DEFAULT_EMISSION: f32 = 1.0;

/// Summary of the engine state after the latest step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Steps advanced since construction or the last reset
    pub step_count: u64,
    /// Sum of all concentration values
    pub total_mass: f64,
    /// Largest concentration value
    pub max_concentration: f32,
    /// Number of blocked cells
    pub obstacle_cells: usize,
    /// Wall time of the latest update in milliseconds
    pub last_step_time_ms: f64,
    /// Mean update wall time over the engine's lifetime in milliseconds
    pub mean_step_time_ms: f64,
}

/// Owned copy of both fields, for handing to a renderer or serializing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub width: usize,
    pub height: usize,
    pub step: u64,
    /// Row-major concentration values
    pub concentration: Vec<f32>,
    /// Row-major obstacle flags
    pub obstacles: Vec<bool>,
}

/// 2D contaminant diffusion engine
///
/// # Example
///
/// ```rust
/// use aerocell_core::DiffusionGridEngine;
///
/// let mut engine = DiffusionGridEngine::with_dimensions(5, 5, 1.0, 0.0).unwrap();
/// engine.emit(2, 2, 1.0);
/// engine.update();
/// assert_eq!(engine.concentration_at(2, 2), Some(0.0));
/// assert_eq!(engine.concentration_at(1, 2), Some(0.25));
/// ```
#[derive(Debug, Clone)]
pub struct DiffusionGridEngine {
    config: EngineConfig,

    // Ping-pong buffers (read from one, write to other, then swap)
    concentration: FieldData,
    concentration_back: FieldData,

    obstacles: ObstacleMask,

    step_count: u64,
    timer: StepTimer,
}

impl Default for DiffusionGridEngine {
    /// 50×50 grid, diffusion 0.1, decay 0.005
    fn default() -> Self {
        let config = EngineConfig::default();
        let field = FieldData::new(config.width, config.height);
        Self::from_parts(
            config,
            field.clone(),
            field,
            ObstacleMask::new(config.width, config.height),
        )
    }
}

impl DiffusionGridEngine {
    /// Create an engine from a configuration
    ///
    /// Both fields start at zero.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidDimensions` if the grid shape is empty and
    /// `EngineError::GridTooLarge` if the buffers cannot be addressed or
    /// allocated.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let too_large = || EngineError::GridTooLarge {
            width: config.width,
            height: config.height,
        };
        let concentration = FieldData::try_new(config.width, config.height).ok_or_else(too_large)?;
        let concentration_back =
            FieldData::try_new(config.width, config.height).ok_or_else(too_large)?;
        let obstacles = ObstacleMask::try_new(config.width, config.height).ok_or_else(too_large)?;

        Ok(Self::from_parts(config, concentration, concentration_back, obstacles))
    }

    /// Create an engine with a sequential sweep
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_dimensions(
        width: usize,
        height: usize,
        diffusion: f32,
        decay: f32,
    ) -> Result<Self, EngineError> {
        Self::new(EngineConfig::new(width, height, diffusion, decay))
    }

    fn from_parts(
        config: EngineConfig,
        concentration: FieldData,
        concentration_back: FieldData,
        obstacles: ObstacleMask,
    ) -> Self {
        info!(
            "Diffusion engine initialized: {}x{} grid, diffusion={}, decay={}, parallel={}",
            config.width, config.height, config.diffusion, config.decay, config.parallel
        );

        Self {
            concentration,
            concentration_back,
            obstacles,
            config,
            step_count: 0,
            timer: StepTimer::new(),
        }
    }

    /// Block the half-open rectangle `[x1, x2) × [y1, y2)`
    ///
    /// The rectangle is clipped to the grid; inverted, empty or fully outside
    /// rectangles change nothing. Concentration already sitting on newly
    /// blocked cells is cleared by the next [`update`](Self::update), not here.
    ///
    /// Returns the number of cells that became blocked.
    pub fn add_obstacle(&mut self, x1: i64, y1: i64, x2: i64, y2: i64) -> usize {
        let Some(rect) = CellRect::clip(x1, y1, x2, y2, self.config.width, self.config.height)
        else {
            trace!("Obstacle ({x1},{y1})-({x2},{y2}) lies outside the grid, ignored");
            return 0;
        };

        let added = self.obstacles.mark(rect);
        debug!(
            "Obstacle ({},{})-({},{}): {} new cells, {} blocked total",
            rect.x_min,
            rect.y_min,
            rect.x_max,
            rect.y_max,
            added,
            self.obstacles.blocked_count()
        );
        added
    }

    /// Overwrite the concentration at `(x, y)`
    ///
    /// Out-of-grid coordinates are silently dropped. Obstacle cells accept the
    /// value until the next update zeroes it.
    ///
    /// Returns `true` if a cell was written.
    pub fn emit(&mut self, x: i64, y: i64, concentration: f32) -> bool {
        match self.concentration.index_of(x, y) {
            Some(idx) => {
                self.concentration.as_mut_slice()[idx] = concentration;
                true
            }
            None => {
                trace!("Emission at ({x},{y}) is outside the grid, dropped");
                false
            }
        }
    }

    /// [`emit`](Self::emit) with [`DEFAULT_EMISSION`]
    pub fn emit_default(&mut self, x: i64, y: i64) -> bool {
        self.emit(x, y, DEFAULT_EMISSION)
    }

    /// Advance the simulation by exactly one step
    ///
    /// Every new value is computed from the previous field only; the new field
    /// replaces the old one as a whole. Afterwards every obstacle cell is 0.
    pub fn update(&mut self) {
        let scope = ProfilerScope::new("diffusion_update");

        let params = DiffusionParams {
            diffusion: self.config.diffusion,
            decay: self.config.decay,
        };

        step_diffusion_cpu(
            self.concentration.as_slice(),
            self.concentration_back.as_mut_slice(),
            self.obstacles.as_slice(),
            self.config.width,
            self.config.height,
            params,
            SweepMode::from_parallel_flag(self.config.parallel),
        );

        // Swap buffers
        std::mem::swap(&mut self.concentration, &mut self.concentration_back);

        self.step_count += 1;
        let elapsed_ms = scope.elapsed_ms();
        self.timer.record(elapsed_ms);

        debug!(
            "Step {}: mass={:.6}, max={:.6}, {:.3}ms",
            self.step_count,
            self.concentration.sum(),
            self.concentration.max(),
            elapsed_ms
        );
    }

    /// Set every concentration cell to 0 and restart the step count.
    /// Obstacles are left in place.
    pub fn reset(&mut self) {
        self.concentration.fill(0.0);
        self.step_count = 0;
        debug!("Concentration field reset");
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.config.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.config.height
    }

    /// Current configuration, including coefficient changes
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Borrow the current concentration field
    #[must_use]
    pub fn concentration(&self) -> &FieldData {
        &self.concentration
    }

    /// Concentration at `(x, y)`, `None` outside the grid
    #[must_use]
    pub fn concentration_at(&self, x: i64, y: i64) -> Option<f32> {
        self.concentration
            .index_of(x, y)
            .map(|idx| self.concentration.as_slice()[idx])
    }

    /// Borrow the obstacle mask
    #[must_use]
    pub fn obstacles(&self) -> &ObstacleMask {
        &self.obstacles
    }

    #[must_use]
    pub fn is_obstacle(&self, x: i64, y: i64) -> bool {
        self.obstacles.is_blocked(x, y)
    }

    /// Owned copy of both fields
    #[must_use]
    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            width: self.config.width,
            height: self.config.height,
            step: self.step_count,
            concentration: self.concentration.as_slice().to_vec(),
            obstacles: self.obstacles.as_slice().to_vec(),
        }
    }

    #[must_use]
    pub fn diffusion(&self) -> f32 {
        self.config.diffusion
    }

    /// Change the diffusion weight; applies from the next update on.
    pub fn set_diffusion(&mut self, diffusion: f32) {
        if !(0.0..=1.0).contains(&diffusion) {
            debug!("Diffusion {diffusion} is outside [0, 1]; field may amplify or oscillate");
        }
        self.config.diffusion = diffusion;
    }

    #[must_use]
    pub fn decay(&self) -> f32 {
        self.config.decay
    }

    /// Change the decay; applies from the next update on.
    pub fn set_decay(&mut self, decay: f32) {
        if !(0.0..1.0).contains(&decay) {
            debug!("Decay {decay} is outside [0, 1); field may grow or flip sign");
        }
        self.config.decay = decay;
    }

    /// Switch between sequential and row-parallel sweeps
    pub fn set_parallel(&mut self, parallel: bool) {
        self.config.parallel = parallel;
    }

    /// Sum of all concentration values
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.concentration.sum()
    }

    #[must_use]
    pub fn max_concentration(&self) -> f32 {
        self.concentration.max()
    }

    /// Steps advanced since construction or the last reset
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    #[must_use]
    pub fn last_step_time_ms(&self) -> f64 {
        self.timer.last_step_ms()
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            step_count: self.step_count,
            total_mass: self.total_mass(),
            max_concentration: self.max_concentration(),
            obstacle_cells: self.obstacles.blocked_count(),
            last_step_time_ms: self.timer.last_step_ms(),
            mean_step_time_ms: self.timer.mean_step_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn engine(width: usize, height: usize, diffusion: f32, decay: f32) -> DiffusionGridEngine {
        DiffusionGridEngine::with_dimensions(width, height, diffusion, decay).unwrap()
    }

    #[test]
    fn test_new_engine_is_zeroed() {
        let engine = DiffusionGridEngine::default();
        assert_eq!(engine.width(), 50);
        assert_eq!(engine.height(), 50);
        assert_eq!(engine.diffusion(), 0.1);
        assert_eq!(engine.decay(), 0.005);
        assert!(engine.concentration().as_slice().iter().all(|&v| v == 0.0));
        assert_eq!(engine.obstacles().blocked_count(), 0);
        assert_eq!(engine.step_count(), 0);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            DiffusionGridEngine::with_dimensions(0, 10, 0.1, 0.0),
            Err(EngineError::InvalidDimensions { .. })
        ));
        assert!(DiffusionGridEngine::with_dimensions(10, 0, 0.1, 0.0).is_err());
    }

    #[test]
    fn test_oversized_grid_is_an_error_not_a_panic() {
        assert!(matches!(
            DiffusionGridEngine::with_dimensions(usize::MAX / 2, 4, 0.1, 0.0),
            Err(EngineError::GridTooLarge { .. })
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_unallocatable_grid_is_an_error_not_a_panic() {
        // Addressable in bytes, but no allocator can hand out 2^62 bytes
        let err = DiffusionGridEngine::with_dimensions(1 << 30, 1 << 30, 0.1, 0.0).unwrap_err();
        assert_eq!(
            err,
            EngineError::GridTooLarge {
                width: 1 << 30,
                height: 1 << 30
            }
        );
    }

    #[test]
    fn test_emit_overwrites_in_bounds() {
        let mut engine = engine(4, 3, 0.1, 0.0);
        assert!(engine.emit(3, 2, 2.5));
        assert_eq!(engine.concentration_at(3, 2), Some(2.5));

        assert!(engine.emit(3, 2, 0.5));
        assert_eq!(engine.concentration_at(3, 2), Some(0.5), "overwrite, not add");

        assert!(engine.emit_default(0, 0));
        assert_eq!(engine.concentration_at(0, 0), Some(DEFAULT_EMISSION));
    }

    #[test]
    fn test_emit_out_of_bounds_is_noop() {
        let mut engine = engine(4, 3, 0.1, 0.0);
        let before = engine.snapshot();
        for &(x, y) in &[(-1, 0), (0, -1), (4, 0), (0, 3), (100, 100), (i64::MIN, i64::MAX)] {
            assert!(!engine.emit(x, y, 9.0), "({x},{y}) should be dropped");
        }
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_stencil_scenario() {
        let mut engine = engine(5, 5, 1.0, 0.0);
        engine.emit(2, 2, 1.0);
        engine.update();

        for y in 0..5 {
            for x in 0..5 {
                let expected = match (x, y) {
                    (1, 2) | (3, 2) | (2, 1) | (2, 3) => 0.25,
                    _ => 0.0,
                };
                assert_eq!(engine.concentration_at(x, y), Some(expected), "cell ({x},{y})");
            }
        }
        assert_eq!(engine.step_count(), 1);
    }

    #[test]
    fn test_emit_on_obstacle_cleared_by_update() {
        let mut engine = engine(6, 6, 0.2, 0.0);
        engine.add_obstacle(2, 2, 4, 4);
        engine.emit(2, 2, 5.0);
        assert_eq!(engine.concentration_at(2, 2), Some(5.0), "transient value accepted");

        engine.update();
        for y in 2..4 {
            for x in 2..4 {
                assert_eq!(engine.concentration_at(x, y), Some(0.0));
            }
        }
    }

    #[test]
    fn test_add_obstacle_does_not_zero_immediately() {
        let mut engine = engine(4, 4, 0.1, 0.0);
        engine.emit(1, 1, 3.0);
        engine.add_obstacle(0, 0, 2, 2);
        assert_eq!(engine.concentration_at(1, 1), Some(3.0));
        engine.update();
        assert_eq!(engine.concentration_at(1, 1), Some(0.0));
    }

    #[test]
    fn test_add_obstacle_clips_and_ignores_invalid() {
        let mut engine = engine(5, 5, 0.1, 0.0);
        assert_eq!(engine.add_obstacle(3, 3, 10, 10), 4);
        assert_eq!(engine.add_obstacle(-2, 0, 1, 1), 1);
        assert_eq!(engine.add_obstacle(4, 4, 2, 2), 0, "inverted");
        assert_eq!(engine.add_obstacle(7, 7, 9, 9), 0, "outside");
        assert_eq!(engine.obstacles().blocked_count(), 5);
        assert!(engine.is_obstacle(4, 4));
        assert!(engine.is_obstacle(0, 0));
        assert!(!engine.is_obstacle(5, 5));
    }

    #[test]
    fn test_parameter_change_applies_to_next_step_only() {
        let mut engine = engine(5, 5, 1.0, 0.0);
        engine.emit(2, 2, 1.0);
        engine.update();
        let after_first = engine.snapshot();

        engine.set_diffusion(0.0);
        engine.set_decay(0.5);
        assert_eq!(
            engine.snapshot(),
            after_first,
            "setters must not touch the field"
        );

        engine.update();
        // diffusion 0 keeps each cell, decay halves it
        assert_eq!(engine.concentration_at(1, 2), Some(0.125));
        assert_eq!(engine.concentration_at(2, 2), Some(0.0));
    }

    #[test]
    fn test_reset_keeps_obstacles() {
        let mut engine = engine(5, 5, 0.3, 0.01);
        engine.add_obstacle(0, 0, 1, 5);
        engine.emit(3, 3, 4.0);
        engine.update();
        engine.update();

        engine.reset();
        assert!(engine.concentration().as_slice().iter().all(|&v| v == 0.0));
        assert_eq!(engine.step_count(), 0);
        assert_eq!(engine.obstacles().blocked_count(), 5);
    }

    #[test]
    fn test_uniform_decay_without_diffusion() {
        let mut engine = engine(3, 3, 0.0, 0.1);
        engine.emit(1, 1, 2.0);
        engine.update();
        assert_relative_eq!(engine.concentration_at(1, 1).unwrap(), 1.8, epsilon = 1e-6);
        engine.update();
        assert_relative_eq!(engine.concentration_at(1, 1).unwrap(), 1.62, epsilon = 1e-6);
    }

    #[test]
    fn test_out_of_range_coefficients_stay_deterministic() {
        let mut a = engine(6, 6, 1.7, -0.3);
        let mut b = engine(6, 6, 1.7, -0.3);
        for e in [&mut a, &mut b] {
            e.emit(2, 3, 1.0);
            for _ in 0..10 {
                e.update();
            }
        }
        assert_eq!(a.snapshot(), b.snapshot());
        assert!(a.concentration().as_slice().iter().any(|&v| v < 0.0), "diffusion > 1 inverts");
    }

    #[test]
    fn test_stats_reflect_state() {
        let mut engine = engine(4, 4, 0.0, 0.0);
        engine.add_obstacle(0, 0, 2, 1);
        engine.emit(3, 3, 1.5);
        engine.emit(2, 2, 0.5);
        engine.update();

        let stats = engine.stats();
        assert_eq!(stats.step_count, 1);
        assert_eq!(stats.obstacle_cells, 2);
        assert_eq!(stats.max_concentration, 1.5);
        assert_relative_eq!(stats.total_mass, 2.0, epsilon = 1e-9);
        assert!(stats.last_step_time_ms >= 0.0);
        assert!(stats.mean_step_time_ms >= 0.0);
    }

    #[test]
    fn test_mean_step_time_covers_every_update() {
        let mut engine = engine(8, 8, 0.2, 0.0);
        assert_eq!(engine.stats().mean_step_time_ms, 0.0);
        for _ in 0..3 {
            engine.update();
        }
        let stats = engine.stats();
        assert!(stats.mean_step_time_ms > 0.0);
        assert!(stats.mean_step_time_ms.is_finite());
    }

    #[test]
    fn test_parallel_engine_matches_sequential() {
        let config = EngineConfig::new(31, 17, 0.4, 0.02);
        let mut seq = DiffusionGridEngine::new(config).unwrap();
        let mut par = DiffusionGridEngine::new(config.with_parallel(true)).unwrap();
        for e in [&mut seq, &mut par] {
            e.add_obstacle(10, 0, 12, 12);
            e.emit(3, 8, 10.0);
            e.emit(25, 2, 4.0);
            for _ in 0..25 {
                e.update();
            }
        }
        assert_eq!(seq.concentration(), par.concentration());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut engine = engine(2, 2, 0.1, 0.0);
        engine.add_obstacle(1, 1, 2, 2);
        engine.emit(0, 0, 1.0);
        let json = serde_json::to_value(engine.snapshot()).unwrap();
        assert_eq!(json["width"], 2);
        assert_eq!(json["concentration"][0], 1.0);
        assert_eq!(json["obstacles"][3], true);
    }
}
