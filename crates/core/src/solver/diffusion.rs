//! Diffusion-decay stencil
//!
//! One explicit step of the update rule, evaluated per cell from the previous
//! field only:
//! ```text
//! avg   = (C[x-1,y] + C[x+1,y] + C[x,y-1] + C[x,y+1]) / 4
//! C'    = (C * (1 - D) + avg * D) * (1 - k)
//! C'    = 0                          where obstacle
//! ```
//!
//! Where:
//! - `D`: diffusion blend weight
//! - `k`: per-step decay
//!
//! Neighbors outside the grid read as 0 (absorbing boundary), so edge and
//! corner cells lose mass faster than interior cells.

use rayon::prelude::*;

/// Parameters for one stencil sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionParams {
    /// Blend weight between self-retention and neighbor average
    pub diffusion: f32,
    /// Multiplicative loss applied after blending
    pub decay: f32,
}

/// How the sweep is scheduled over rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepMode {
    /// Single-threaded, row by row
    #[default]
    Sequential,
    /// Rows distributed over the rayon pool
    RowParallel,
}

impl SweepMode {
    #[must_use]
    pub fn from_parallel_flag(parallel: bool) -> Self {
        if parallel {
            Self::RowParallel
        } else {
            Self::Sequential
        }
    }
}

/// Compute one diffusion-decay step from `conc_in` into `conc_out`
///
/// `conc_in`, `conc_out` and `obstacles` must all hold `width * height` cells
/// in row-major order. `conc_out` is fully overwritten; no value in it is read.
///
/// Both sweep modes give bit-identical results because each output cell only
/// reads `conc_in`.
///
/// # Arguments
///
/// * `conc_in` - Previous concentration field
/// * `conc_out` - Output concentration field
/// * `obstacles` - Obstacle mask (true = blocked)
/// * `width` - Grid width in cells
/// * `height` - Grid height in cells
/// * `params` - Diffusion and decay coefficients
/// * `mode` - Row scheduling
pub fn step_diffusion_cpu(
    conc_in: &[f32],
    conc_out: &mut [f32],
    obstacles: &[bool],
    width: usize,
    height: usize,
    params: DiffusionParams,
    mode: SweepMode,
) {
    let cells = width * height;
    assert_eq!(conc_in.len(), cells, "input field size mismatch");
    assert_eq!(conc_out.len(), cells, "output field size mismatch");
    assert_eq!(obstacles.len(), cells, "obstacle mask size mismatch");

    if cells == 0 {
        return;
    }

    match mode {
        SweepMode::Sequential => conc_out
            .chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| sweep_row(conc_in, row, obstacles, y, width, height, params)),
        SweepMode::RowParallel => conc_out
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| sweep_row(conc_in, row, obstacles, y, width, height, params)),
    }
}

#[inline(always)]
fn sweep_row(
    conc_in: &[f32],
    row_out: &mut [f32],
    obstacles: &[bool],
    y: usize,
    width: usize,
    height: usize,
    params: DiffusionParams,
) {
    let retain = 1.0 - params.diffusion;
    let survive = 1.0 - params.decay;

    for (x, cell) in row_out.iter_mut().enumerate() {
        let idx = y * width + x;

        if obstacles[idx] {
            *cell = 0.0;
            continue;
        }

        // Absorbing boundary: off-grid neighbors contribute nothing
        let left = if x > 0 { conc_in[idx - 1] } else { 0.0 };
        let right = if x + 1 < width { conc_in[idx + 1] } else { 0.0 };
        let up = if y > 0 { conc_in[idx - width] } else { 0.0 };
        let down = if y + 1 < height {
            conc_in[idx + width]
        } else {
            0.0
        };

        let neighbor_avg = (right + left + down + up) / 4.0;
        let blended = conc_in[idx] * retain + neighbor_avg * params.diffusion;
        *cell = blended * survive;
    }
}
