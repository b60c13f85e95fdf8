//! Obstacle mask and rectangle clipping
//!
//! Obstacles are impermeable cells: whatever concentration they hold is forced
//! to zero on every update. The mask only ever grows.

use serde::{Deserialize, Serialize};

/// Half-open cell rectangle `[x_min, x_max) × [y_min, y_max)` already clipped
/// to a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    pub x_min: usize,
    pub y_min: usize,
    pub x_max: usize,
    pub y_max: usize,
}

impl CellRect {
    /// Clip a signed half-open rectangle to a `width × height` grid.
    ///
    /// Coordinates are clamped to `[0, width]` / `[0, height]`. Returns `None`
    /// when the clipped rectangle has no cells, which covers inverted,
    /// empty and fully out-of-range input.
    #[must_use]
    pub fn clip(x1: i64, y1: i64, x2: i64, y2: i64, width: usize, height: usize) -> Option<Self> {
        let clamp = |v: i64, limit: usize| -> usize {
            let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
            // Non-negative after clamping, and bounded by `limit`
            v.clamp(0, limit_i64) as usize
        };

        let x_min = clamp(x1, width);
        let x_max = clamp(x2, width);
        let y_min = clamp(y1, height);
        let y_max = clamp(y2, height);

        (x_min < x_max && y_min < y_max).then_some(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Number of cells covered
    #[must_use]
    pub fn area(&self) -> usize {
        (self.x_max - self.x_min) * (self.y_max - self.y_min)
    }
}

/// Boolean obstacle mask, same shape and layout as the concentration field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleMask {
    cells: Vec<bool>,
    width: usize,
    height: usize,
    blocked: usize,
}

impl ObstacleMask {
    /// Create an empty mask without aborting on allocation failure
    #[must_use]
    pub fn try_new(width: usize, height: usize) -> Option<Self> {
        let cells = width.checked_mul(height)?;
        let mut mask = Vec::new();
        mask.try_reserve_exact(cells).ok()?;
        mask.resize(cells, false);
        Some(Self {
            cells: mask,
            width,
            height,
            blocked: 0,
        })
    }

    /// Create an empty mask (no blocked cells)
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![false; width * height],
            width,
            height,
            blocked: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Mask values in row-major order (y * width + x)
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// Number of blocked cells
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.blocked
    }

    /// Whether `(x, y)` is blocked. Cells outside the grid are never blocked.
    #[must_use]
    pub fn is_blocked(&self, x: i64, y: i64) -> bool {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return false;
        };
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    /// Block every cell of `rect`.
    ///
    /// Returns how many cells transitioned from open to blocked; re-marking a
    /// blocked cell is a no-op.
    pub fn mark(&mut self, rect: CellRect) -> usize {
        debug_assert!(rect.x_max <= self.width && rect.y_max <= self.height);

        let mut newly_blocked = 0;
        for y in rect.y_min..rect.y_max {
            let row = &mut self.cells[y * self.width..(y + 1) * self.width];
            for cell in &mut row[rect.x_min..rect.x_max] {
                if !*cell {
                    *cell = true;
                    newly_blocked += 1;
                }
            }
        }
        self.blocked += newly_blocked;
        newly_blocked
    }
}
