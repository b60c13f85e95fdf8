//! Scalar field storage for the concentration grid
//!
//! Fields are stored as a flat `Vec<f32>` in row-major order so that a whole
//! row can be handed to a worker as one contiguous chunk.

/// Concentration field container
///
/// Stores 2D field data as a flat `Vec<f32>` in row-major order.
/// Cell `(x, y)` lives at index `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    /// Field values in row-major order (y * width + x)
    pub(crate) data: Vec<f32>,
    /// Grid width in cells
    pub(crate) width: usize,
    /// Grid height in cells
    pub(crate) height: usize,
}

impl FieldData {
    /// Create a new field with given dimensions, initialized to zero
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells
    /// * `height` - Grid height in cells
    ///
    /// # Returns
    ///
    /// New field initialized to all zeros
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Create a zeroed field without aborting on allocation failure
    ///
    /// Returns `None` if `width * height` overflows or the allocator cannot
    /// provide the buffer.
    #[must_use]
    pub fn try_new(width: usize, height: usize) -> Option<Self> {
        let cells = width.checked_mul(height)?;
        let mut data = Vec::new();
        data.try_reserve_exact(cells).ok()?;
        data.resize(cells, 0.0);
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Create a new field with given dimensions, initialized to a value
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f32) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Grid width in cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Get mutable reference to field data
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Resolve signed grid coordinates to a flat index.
    ///
    /// Returns `None` when `(x, y)` falls outside `[0, width) × [0, height)`.
    #[must_use]
    pub fn index_of(&self, x: i64, y: i64) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// Fill entire field with a value
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Sum of all cell values, accumulated in `f64`
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| f64::from(v)).sum()
    }

    /// Largest cell value (NaN cells are skipped)
    #[must_use]
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Iterate over rows as contiguous slices
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks(self.width.max(1))
    }
}
