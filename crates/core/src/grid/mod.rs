//! Grid storage: the concentration field and the obstacle mask.
//!
//! Both share the same row-major layout (`y * width + x`), so a flat index
//! computed for one is valid for the other.

mod field;
mod obstacle;

pub use field::FieldData;
pub use obstacle::{CellRect, ObstacleMask};
