use crate::types::{CameraIntrinsics, DepthFrame, Point3, PointCloud};

/// Back-projects every valid pixel of `frame` into a point cloud.
///
/// Pixels with depth 0 or at/beyond `max_distance_mm` produce no point. The
/// result is expressed with y up and z backward (y and z of the optical frame
/// negated), which is the convention of the ground plane and obstacle stages.
pub fn deproject(
    frame: &DepthFrame,
    intrinsics: &CameraIntrinsics,
    max_distance_mm: u16,
) -> PointCloud {
    let width = frame.width as usize;
    let mut points = Vec::new();
    let mut pixels = Vec::new();
    for (idx, &depth) in frame.depths_mm.iter().enumerate() {
        if depth == 0 || depth >= max_distance_mm {
            continue;
        }
        let u = (idx % width) as u32;
        let v = (idx / width) as u32;
        let z = depth as f64 / 1000.0;
        let x = (u as f64 - intrinsics.cx) * z / intrinsics.fx;
        let y = (v as f64 - intrinsics.cy) * z / intrinsics.fy;
        points.push(Point3::new(x, -y, -z));
        pixels.push((u, v));
    }
    log::trace!(
        "deprojected {} of {} pixels",
        points.len(),
        frame.depths_mm.len()
    );
    PointCloud {
        points,
        pixels: Some(pixels),
    }
}
