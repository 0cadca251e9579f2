use std::io::Cursor;

use image::GrayImage;
use rerun::{RecordingStream, TimeCell};

use crate::occupancy::OccupancyGrid;
use crate::pipeline::FrameContext;
use crate::scan::RangeScan;
use crate::types::Point3;

const INLIER_COLOR: (u8, u8, u8, u8) = (255, 0, 0, 255);
const OBSTACLE_COLOR: (u8, u8, u8, u8) = (0, 255, 0, 255);
const SCAN_COLOR: (u8, u8, u8, u8) = (255, 200, 0, 255);

fn to_positions(points: &[Point3]) -> Vec<[f32; 3]> {
    points
        .iter()
        .map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect()
}

/// Occupied cells in white, row 0 at the bottom of the image.
pub fn grid_to_image(grid: &OccupancyGrid) -> GrayImage {
    let rows = grid.rows() as u32;
    GrayImage::from_fn(grid.cols() as u32, rows, |x, y| {
        let row = (rows - 1 - y) as usize;
        image::Luma([if grid.is_occupied(row, x as usize) { 255 } else { 0 }])
    })
}

/// Scan endpoints in the ground-aligned frame, at the ground height.
pub fn scan_endpoints(scan: &RangeScan, height: f64) -> Vec<[f32; 3]> {
    scan.hits()
        .map(|(i, r)| {
            // bin angle is measured from forward (-z), positive to the left
            let a = scan.angle(i);
            [-r * a.sin(), height as f32, -r * a.cos()]
        })
        .collect()
}

fn log_grid(recording: &RecordingStream, topic: &str, grid: &OccupancyGrid) -> Result<(), Box<dyn std::error::Error>> {
    let mut bytes: Vec<u8> = Vec::new();
    grid_to_image(grid).write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    recording.log(
        format!("{}/grid", topic),
        &rerun::EncodedImage::from_file_contents(bytes),
    )?;
    Ok(())
}

fn log_clouds(recording: &RecordingStream, topic: &str, ctx: &FrameContext) -> Result<(), Box<dyn std::error::Error>> {
    recording.set_time(
        "stable",
        TimeCell::from_timestamp_nanos_since_epoch(ctx.source_time_ns),
    );
    recording.log(
        format!("{}/inliers", topic),
        &rerun::Points3D::new(to_positions(&ctx.ground.inliers.points))
            .with_colors([INLIER_COLOR])
            .with_radii([rerun::Radius::new_ui_points(2.0)]),
    )?;
    recording.log(
        format!("{}/obstacles", topic),
        &rerun::Points3D::new(to_positions(&ctx.obstacles))
            .with_colors([OBSTACLE_COLOR])
            .with_radii([rerun::Radius::new_ui_points(4.0)]),
    )?;
    recording.log(
        format!("{}/scan", topic),
        &rerun::Points3D::new(scan_endpoints(&ctx.record.scan, ctx.ground_height))
            .with_colors([SCAN_COLOR])
            .with_radii([rerun::Radius::new_ui_points(6.0)]),
    )?;
    Ok(())
}

/// Logs one processed frame. Failures are reported and otherwise ignored.
pub fn log_frame(recording: &RecordingStream, topic: &str, ctx: &FrameContext) {
    if let Err(e) = log_clouds(recording, topic, ctx) {
        log::warn!("visualization: cannot log clouds: {e}");
    }
    if let Err(e) = log_grid(recording, topic, &ctx.grid) {
        log::warn!("visualization: cannot log grid: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::scan::synthesize_scan;

    #[test]
    fn test_grid_image_orientation() {
        let mut grid = OccupancyGrid::new(4, 3, 0.01);
        grid.set(0, 2);
        let img = grid_to_image(&grid);
        assert_eq!(img.dimensions(), (3, 4));
        assert_eq!(img.get_pixel(2, 3).0, [255]);
        assert_eq!(img.get_pixel(2, 0).0, [0]);
    }

    #[test]
    fn test_scan_endpoint_straight_ahead() {
        let mut grid = OccupancyGrid::new(500, 400, 0.01);
        // column 200 is bin 199, the last bin left of straight ahead
        grid.set(150, 200);
        let scan = synthesize_scan(&grid, &ScanConfig::default());
        let points = scan_endpoints(&scan, -0.5);
        assert_eq!(points.len(), 1);
        let [x, y, z] = points[0];
        assert!(x.abs() < 0.02);
        assert_eq!(y, -0.5);
        assert!((z + 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_log_grid_to_memory_sink() {
        let (recording, storage) = rerun::RecordingStreamBuilder::new("depth2scan_test")
            .memory()
            .unwrap();
        let mut grid = OccupancyGrid::new(50, 40, 0.01);
        grid.set(10, 20);
        assert!(log_grid(&recording, "test", &grid).is_ok());
        recording.flush_blocking();
        assert!(!storage.take().is_empty());
    }
}
