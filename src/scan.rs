use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::occupancy::OccupancyGrid;

/// Planar range scan, one range per grid column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeScan {
    pub angle_min: f32,
    pub angle_max: f32,
    pub angle_increment: f32,
    pub time_increment: f32,
    pub range_min: f32,
    pub range_max: f32,
    pub ranges: Vec<f32>,
}

impl RangeScan {
    /// Angle of bin `i`.
    pub fn angle(&self, i: usize) -> f32 {
        self.angle_min + i as f32 * self.angle_increment
    }

    /// Bin that holds grid column `col`; the lateral axis is reversed.
    /// `None` when the scan has no such column.
    pub fn bin_for_column(&self, col: usize) -> Option<usize> {
        self.ranges.len().checked_sub(col + 1)
    }

    /// Bins with a range below `range_max`.
    pub fn hits(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .filter(|(_, r)| **r < self.range_max)
            .map(|(i, r)| (i, *r))
    }
}

/// Nearest occupied cell of every column as a range.
///
/// Bin 0 is the rightmost grid column. Columns without an occupied cell
/// report `range_max`.
pub fn synthesize_scan(grid: &OccupancyGrid, config: &ScanConfig) -> RangeScan {
    let cols = grid.cols();
    let ranges = (0..cols)
        .map(|i| {
            let col = cols - 1 - i;
            (0..grid.rows())
                .find(|&row| grid.is_occupied(row, col))
                .map(|row| ((row as f64 * grid.cell_size) as f32).clamp(config.range_min, config.range_max))
                .unwrap_or(config.range_max)
        })
        .collect();
    RangeScan {
        angle_min: -PI / 2.0,
        angle_max: PI / 2.0,
        angle_increment: PI / cols as f32,
        time_increment: 0.0,
        range_min: config.range_min,
        range_max: config.range_max,
        ranges,
    }
}
