//! Top-down occupancy grid of obstacle points.
//!
//! Row 0 is nearest to the camera and rows grow forward; column 0 is the
//! leftmost lateral cell (most negative x).

use nalgebra as na;

use crate::config::GridConfig;
use crate::types::Point3;

/// Binary grid of `cell_size` square cells.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    pub cell_size: f64,
    /// 0 = free, 1 = occupied.
    pub cells: na::DMatrix<u8>,
}

impl OccupancyGrid {
    pub fn new(rows: usize, cols: usize, cell_size: f64) -> OccupancyGrid {
        OccupancyGrid {
            cell_size,
            cells: na::DMatrix::zeros(rows, cols),
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cells[(row, col)] != 0
    }

    pub fn set(&mut self, row: usize, col: usize) {
        self.cells[(row, col)] = 1;
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| **c != 0).count()
    }

    /// Patch-density threshold.
    ///
    /// The grid is tiled with `patch_size` square patches (clipped at the far
    /// edges). Every cell of a patch whose raw sum exceeds `threshold` is set,
    /// every other cell is cleared.
    pub fn binarize(&self, patch_size: usize, threshold: u32) -> OccupancyGrid {
        let (rows, cols) = self.cells.shape();
        let mut out = OccupancyGrid::new(rows, cols, self.cell_size);
        for r0 in (0..rows).step_by(patch_size) {
            let h = patch_size.min(rows - r0);
            for c0 in (0..cols).step_by(patch_size) {
                let w = patch_size.min(cols - c0);
                let sum: u32 = self
                    .cells
                    .view((r0, c0), (h, w))
                    .iter()
                    .map(|&c| c as u32)
                    .sum();
                if sum > threshold {
                    out.cells.view_mut((r0, c0), (h, w)).fill(1);
                }
            }
        }
        out
    }
}

/// Marks the cell under each point.
///
/// Indices are truncated toward zero; points outside the grid are dropped.
pub fn rasterize(points: &[Point3], grid: &GridConfig) -> OccupancyGrid {
    let mut out = OccupancyGrid::new(grid.rows(), grid.cols(), grid.cell_size);
    let offset = grid.lateral_offset();
    let mut dropped = 0usize;
    for p in points {
        let col = ((offset + p.x) / grid.cell_size) as i64;
        let row = (-p.z / grid.cell_size) as i64;
        if row >= 0 && col >= 0 && (row as usize) < out.rows() && (col as usize) < out.cols() {
            out.set(row as usize, col as usize);
        } else {
            dropped += 1;
        }
    }
    log::trace!(
        "rasterized {} points into {} cells, {} outside the grid",
        points.len(),
        out.occupied_count(),
        dropped
    );
    out
}

/// Rasterizes and binarizes in one step.
pub fn occupancy_from_points(points: &[Point3], grid: &GridConfig) -> OccupancyGrid {
    rasterize(points, grid).binarize(grid.patch_size, grid.density_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_mapping() {
        let grid = GridConfig::default();
        let raw = rasterize(&[Point3::new(0.255, -0.3, -1.234)], &grid);
        assert_eq!(raw.occupied_count(), 1);
        assert!(raw.is_occupied(123, 225));
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        let grid = GridConfig::default();
        let points = [
            Point3::new(2.5, -0.3, -1.0),
            Point3::new(-2.5, -0.3, -1.0),
            Point3::new(0.0, -0.3, -5.5),
        ];
        assert_eq!(rasterize(&points, &grid).occupied_count(), 0);
    }

    #[test]
    fn test_repeated_points_count_once() {
        let grid = GridConfig::default();
        let points = vec![Point3::new(0.0, -0.3, -1.005); 50];
        assert_eq!(rasterize(&points, &grid).occupied_count(), 1);
    }

    #[test]
    fn test_patch_threshold_is_strict() {
        let mut raw = OccupancyGrid::new(20, 20, 0.01);
        // 10 cells in the first patch: not enough
        for c in 0..10 {
            raw.set(3, c);
        }
        // 11 cells in the last patch: enough
        for c in 10..20 {
            raw.set(15, c);
        }
        raw.set(16, 12);

        let bin = raw.binarize(10, 10);
        assert_eq!(bin.occupied_count(), 100);
        assert!(!bin.is_occupied(3, 0));
        assert!(bin.is_occupied(10, 10));
        assert!(bin.is_occupied(19, 19));
        assert!(!bin.is_occupied(10, 9));
    }

    #[test]
    fn test_edge_patches_are_clipped() {
        let mut raw = OccupancyGrid::new(15, 12, 0.01);
        for r in 10..15 {
            for c in 10..12 {
                raw.set(r, c);
            }
        }
        raw.set(14, 9);
        // 10 cells in the clipped corner patch
        assert_eq!(raw.binarize(10, 9).occupied_count(), 10);
        assert_eq!(raw.binarize(10, 10).occupied_count(), 0);
    }

    #[test]
    fn test_deterministic_and_binary() {
        let grid = GridConfig::default();
        let points: Vec<Point3> = (0..40)
            .flat_map(|i| {
                (0..40).map(move |j| Point3::new(-0.3 + 0.004 * i as f64, -0.3, -1.0 - 0.004 * j as f64))
            })
            .collect();
        let a = occupancy_from_points(&points, &grid);
        let b = occupancy_from_points(&points, &grid);
        assert_eq!(a, b);
        assert!(a.cells.iter().all(|&c| c <= 1));
        assert!(a.occupied_count() > 0);
        assert_eq!(a.occupied_count() % 100, 0);
    }
}
