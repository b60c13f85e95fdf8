//! `AeroCell` core library
//!
//! Simulates a scalar contaminant spreading over a 2D grid in discrete steps.
//! Each step blends every cell with the mean of its four orthogonal neighbors,
//! applies a uniform decay, and forces impermeable obstacle cells to zero.
//! Off-grid neighbors read as zero, so mass drains out through the edges.
//!
//! The crate is split into:
//! - [`grid`]: field and obstacle storage
//! - [`solver`]: the pure stencil kernel and timing helpers
//! - [`simulation`]: the engine, configuration, map presets and playback loop

pub mod grid;
pub mod simulation;
pub mod solver;

pub use grid::{CellRect, FieldData, ObstacleMask};
pub use simulation::{
    DiffusionGridEngine, EmissionSource, EngineConfig, EngineError, EngineStats, FieldSnapshot,
    MapPreset, Playback, PlaybackPolicy, PlaybackSummary, ScenarioError, StopReason,
    DEFAULT_EMISSION,
};
