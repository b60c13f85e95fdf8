//! Preset obstacle maps and the standard release point
//!
//! The layouts are drawn for the default 50×50 grid. On smaller grids the
//! rectangles are clipped like any other obstacle.

use super::DiffusionGridEngine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Obstacle rectangle `(x1, y1, x2, y2)`, half-open
pub type ObstacleRect = (i64, i64, i64, i64);

const SIMPLE_MAP: &[ObstacleRect] = &[
    // Central barrier
    (20, 10, 22, 40),
];

const COMPLEX_MAP: &[ObstacleRect] = &[
    (15, 5, 17, 20),  // Left vertical barrier
    (33, 10, 35, 25), // Right vertical barrier
    (20, 30, 30, 32), // Lower horizontal barrier
    (10, 35, 15, 40), // Lower-left block
    (35, 15, 45, 17), // Upper-right bar
];

/// Built-in obstacle layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapPreset {
    /// No obstacles
    Open,
    /// One central barrier
    #[default]
    Simple,
    /// Several scattered barriers
    Complex,
}

impl MapPreset {
    pub const ALL: [MapPreset; 3] = [MapPreset::Open, MapPreset::Simple, MapPreset::Complex];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            MapPreset::Open => "open",
            MapPreset::Simple => "simple",
            MapPreset::Complex => "complex",
        }
    }

    /// Obstacle rectangles of this layout
    #[must_use]
    pub fn obstacles(&self) -> &'static [ObstacleRect] {
        match self {
            MapPreset::Open => &[],
            MapPreset::Simple => SIMPLE_MAP,
            MapPreset::Complex => COMPLEX_MAP,
        }
    }

    /// Register every rectangle of this layout on `engine`.
    ///
    /// Returns the number of newly blocked cells.
    pub fn apply(&self, engine: &mut DiffusionGridEngine) -> usize {
        let added = self
            .obstacles()
            .iter()
            .map(|&(x1, y1, x2, y2)| engine.add_obstacle(x1, y1, x2, y2))
            .sum();
        info!("Applied '{}' map: {} obstacle cells", self.name(), added);
        added
    }
}

impl fmt::Display for MapPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapPreset {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" | "empty" => Ok(MapPreset::Open),
            "simple" => Ok(MapPreset::Simple),
            "complex" => Ok(MapPreset::Complex),
            _ => Err(ScenarioError::UnknownPreset(s.to_string())),
        }
    }
}

/// A point release of contaminant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionSource {
    pub x: i64,
    pub y: i64,
    pub concentration: f32,
}

impl Default for EmissionSource {
    /// Left of the central barrier, mid-height, strength 10
    fn default() -> Self {
        Self {
            x: 10,
            y: 25,
            concentration: 10.0,
        }
    }
}

impl EmissionSource {
    /// Write this source into `engine`; `false` if it lies off the grid.
    pub fn release(&self, engine: &mut DiffusionGridEngine) -> bool {
        engine.emit(self.x, self.y, self.concentration)
    }
}

/// Errors from scenario parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    /// Preset name not recognized
    UnknownPreset(String),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::UnknownPreset(name) => {
                write!(f, "Unknown map preset '{name}' (expected open, simple or complex)")
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_map_blocks_central_barrier() {
        let mut engine = DiffusionGridEngine::default();
        assert_eq!(MapPreset::Simple.apply(&mut engine), 2 * 30);
        assert!(engine.is_obstacle(20, 10));
        assert!(engine.is_obstacle(21, 39));
        assert!(!engine.is_obstacle(22, 10));
        assert!(!engine.is_obstacle(20, 40));
    }

    #[test]
    fn test_complex_map_cell_count() {
        let mut engine = DiffusionGridEngine::default();
        // 30 + 30 + 20 + 25 + 20, no overlaps
        assert_eq!(MapPreset::Complex.apply(&mut engine), 125);
        assert_eq!(engine.obstacles().blocked_count(), 125);
    }

    #[test]
    fn test_open_map_is_empty() {
        let mut engine = DiffusionGridEngine::default();
        assert_eq!(MapPreset::Open.apply(&mut engine), 0);
    }

    #[test]
    fn test_presets_clip_on_small_grid() {
        let mut engine = DiffusionGridEngine::with_dimensions(21, 12, 0.1, 0.0).unwrap();
        // Only column 20, rows 10..12 of the central barrier fit
        assert_eq!(MapPreset::Simple.apply(&mut engine), 2);
    }

    #[test]
    fn test_parse_presets() {
        for preset in MapPreset::ALL {
            assert_eq!(preset.name().parse::<MapPreset>(), Ok(preset));
        }
        assert_eq!(" Complex ".parse::<MapPreset>(), Ok(MapPreset::Complex));
        assert_eq!(
            "maze".parse::<MapPreset>(),
            Err(ScenarioError::UnknownPreset("maze".to_string()))
        );
    }

    #[test]
    fn test_default_release_point() {
        let mut engine = DiffusionGridEngine::default();
        let source = EmissionSource::default();
        assert!(source.release(&mut engine));
        assert_eq!(engine.concentration_at(10, 25), Some(10.0));

        let off_grid = EmissionSource {
            x: 60,
            ..source
        };
        assert!(!off_grid.release(&mut engine));
    }
}
