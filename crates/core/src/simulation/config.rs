//! Engine configuration and construction errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default grid width in cells
pub const DEFAULT_WIDTH: usize = 50;
/// Default grid height in cells
pub const DEFAULT_HEIGHT: usize = 50;
/// Default diffusion blend weight
pub const DEFAULT_DIFFUSION: f32 = 0.1;
/// Default per-step decay
pub const DEFAULT_DECAY: f32 = 0.005;

/// Construction parameters for [`super::DiffusionGridEngine`]
///
/// `width` and `height` are fixed once the engine exists. `diffusion` and
/// `decay` are unchecked: values outside `[0, 1]` / `[0, 1)` give
/// non-physical but deterministic fields (amplification, sign flips).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Blend weight between self-retention and neighbor average, conceptually [0, 1]
    pub diffusion: f32,
    /// Multiplicative loss per step, conceptually [0, 1)
    pub decay: f32,
    /// Spread the stencil sweep over the rayon pool
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            diffusion: DEFAULT_DIFFUSION,
            decay: DEFAULT_DECAY,
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Config with the given shape and coefficients, sequential sweep
    #[must_use]
    pub fn new(width: usize, height: usize, diffusion: f32, decay: f32) -> Self {
        Self {
            width,
            height,
            diffusion,
            decay,
            parallel: false,
        }
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the grid shape.
    ///
    /// Only dimensions are validated; coefficients are caller preconditions.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidDimensions` if either dimension is zero and
    /// `EngineError::GridTooLarge` if one field buffer would exceed
    /// `isize::MAX` bytes.
    pub fn validate(&self) -> Result<usize, EngineError> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let bytes = self
            .width
            .checked_mul(self.height)
            .and_then(|cells| cells.checked_mul(std::mem::size_of::<f32>()));
        match bytes {
            Some(bytes) if bytes <= isize::MAX as usize => Ok(self.width * self.height),
            _ => Err(EngineError::GridTooLarge {
                width: self.width,
                height: self.height,
            }),
        }
    }
}

/// Errors raised while building an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Width or height is zero
    InvalidDimensions { width: usize, height: usize },
    /// The field buffers cannot be addressed or allocated
    GridTooLarge { width: usize, height: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidDimensions { width, height } => write!(
                f,
                "grid dimensions must be positive, got {width}x{height}"
            ),
            EngineError::GridTooLarge { width, height } => {
                write!(f, "grid of {width}x{height} cells overflows addressable size")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_values() {
        let config = EngineConfig::default();
        assert_eq!(config.width, 50);
        assert_eq!(config.height, 50);
        assert_eq!(config.diffusion, 0.1);
        assert_eq!(config.decay, 0.005);
        assert!(!config.parallel);
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        assert_eq!(
            EngineConfig::new(0, 5, 0.1, 0.0).validate(),
            Err(EngineError::InvalidDimensions {
                width: 0,
                height: 5
            })
        );
        assert!(EngineConfig::new(5, 0, 0.1, 0.0).validate().is_err());
        assert_eq!(EngineConfig::new(4, 5, 0.1, 0.0).validate(), Ok(20));
    }

    #[test]
    fn test_validate_rejects_overflow() {
        let err = EngineConfig::new(usize::MAX, 2, 0.1, 0.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, EngineError::GridTooLarge { .. }));
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_validate_rejects_unaddressable_byte_size() {
        // cell count fits in usize but four bytes per cell do not
        let width = usize::MAX / 4 + 1;
        assert!(matches!(
            EngineConfig::new(width, 1, 0.1, 0.0).validate(),
            Err(EngineError::GridTooLarge { .. })
        ));
        let width = (isize::MAX as usize) / 4;
        assert_eq!(EngineConfig::new(width, 1, 0.1, 0.0).validate(), Ok(width));
    }

    #[test]
    fn test_out_of_range_coefficients_are_accepted() {
        assert!(EngineConfig::new(3, 3, 1.5, -0.2).validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"width": 8, "decay": 0.02}"#).unwrap();
        assert_eq!(config.width, 8);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.decay, 0.02);
        assert_eq!(config.diffusion, DEFAULT_DIFFUSION);
    }
}
