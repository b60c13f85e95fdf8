//! Stencil solver for the concentration field
//!
//! The solver is a pure function over slices: it reads the previous field and
//! the obstacle mask and writes a complete new field. Buffer ownership and
//! swapping live in [`crate::simulation::DiffusionGridEngine`].
//!
//! # Example
//!
//! ```rust
//! use aerocell_core::solver::{step_diffusion_cpu, DiffusionParams, SweepMode};
//!
//! let (w, h) = (3, 3);
//! let mut conc = vec![0.0_f32; w * h];
//! conc[4] = 1.0;
//! let mut next = vec![0.0_f32; w * h];
//! let params = DiffusionParams { diffusion: 1.0, decay: 0.0 };
//! step_diffusion_cpu(&conc, &mut next, &[false; 9], w, h, params, SweepMode::Sequential);
//! assert_eq!(next[1], 0.25);
//! ```

mod diffusion;
pub mod profiler;

pub use diffusion::{step_diffusion_cpu, DiffusionParams, SweepMode};
pub use profiler::{ProfilerScope, StepTimer};
