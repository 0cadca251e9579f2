use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::CameraIntrinsics;

/// RANSAC ground plane parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneFitConfig {
    /// Max point-to-plane distance of an inlier, meters.
    pub distance_threshold: f64,
    pub iterations: usize,
    /// Seed for the per-frame random source.
    pub seed: u64,
}

impl Default for PlaneFitConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.05,
            iterations: 20,
            seed: 0,
        }
    }
}

/// Acceptance window for obstacle points in the ground-aligned frame.
///
/// Up is +y and forward is -z, so the window is expressed in negative values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleBounds {
    /// Points must be higher than ground + margin.
    pub ground_margin: f64,
    /// Points must be lower than this y value.
    pub ceiling: f64,
    pub forward_min: f64,
    pub forward_max: f64,
}

impl Default for ObstacleBounds {
    fn default() -> Self {
        Self {
            ground_margin: 0.2,
            ceiling: -0.1,
            forward_min: -2.0,
            forward_max: -0.5,
        }
    }
}

/// Occupancy grid geometry and patch binarization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length of one square cell, meters.
    pub cell_size: f64,
    /// Total lateral width, centered on the camera.
    pub lateral_extent: f64,
    pub forward_extent: f64,
    /// Patch edge length in cells.
    pub patch_size: usize,
    /// A patch is occupied when its raw sum exceeds this.
    pub density_threshold: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 0.01,
            lateral_extent: 4.0,
            forward_extent: 5.0,
            patch_size: 10,
            density_threshold: 10,
        }
    }
}

impl GridConfig {
    pub fn rows(&self) -> usize {
        cell_count(self.forward_extent, self.cell_size)
    }

    pub fn cols(&self) -> usize {
        cell_count(self.lateral_extent, self.cell_size)
    }

    pub fn lateral_offset(&self) -> f64 {
        self.lateral_extent / 2.0
    }
}

fn cell_count(extent: f64, cell_size: f64) -> usize {
    let n = (extent / cell_size).round();
    if n.is_finite() && n > 0.0 { n as usize } else { 0 }
}

/// Output scan limits and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub range_min: f32,
    pub range_max: f32,
    pub frame_id: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            range_min: 0.0,
            range_max: 5.0,
            frame_id: "odom".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub intrinsics: CameraIntrinsics,
    /// Depth samples at or beyond this are dropped before deprojection.
    pub max_distance_mm: u16,
    pub plane: PlaneFitConfig,
    pub obstacles: ObstacleBounds,
    pub grid: GridConfig,
    pub scan: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intrinsics: CameraIntrinsics::default(),
            max_distance_mm: 5000,
            plane: PlaneFitConfig::default(),
            obstacles: ObstacleBounds::default(),
            grid: GridConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Checks every parameter the pipeline depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.intrinsics.validate()?;
        if self.max_distance_mm == 0 {
            return Err(ConfigError::ZeroMaxDistance);
        }

        let plane = &self.plane;
        if !(plane.distance_threshold.is_finite() && plane.distance_threshold > 0.0) {
            return Err(ConfigError::invalid(
                "plane.distance_threshold",
                format!("{} is not positive", plane.distance_threshold),
            ));
        }
        if plane.iterations == 0 {
            return Err(ConfigError::invalid("plane.iterations", "must be non-zero"));
        }

        let bounds = &self.obstacles;
        if [bounds.ground_margin, bounds.ceiling, bounds.forward_min, bounds.forward_max]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(ConfigError::invalid("obstacles", "bounds must be finite"));
        }
        if bounds.forward_min >= bounds.forward_max {
            return Err(ConfigError::invalid(
                "obstacles.forward_min",
                format!("{} >= forward_max {}", bounds.forward_min, bounds.forward_max),
            ));
        }

        let grid = &self.grid;
        if !(grid.cell_size.is_finite() && grid.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(grid.cell_size));
        }
        if grid.rows() == 0 || grid.cols() == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: grid.rows(),
                cols: grid.cols(),
            });
        }
        if grid.patch_size == 0 {
            return Err(ConfigError::ZeroPatchSize);
        }

        let scan = &self.scan;
        if !(scan.range_min.is_finite() && scan.range_max.is_finite())
            || scan.range_min < 0.0
            || scan.range_max <= scan.range_min
        {
            return Err(ConfigError::invalid(
                "scan.range_max",
                format!("[{}, {}] is not a valid range", scan.range_min, scan.range_max),
            ));
        }
        Ok(())
    }
}
