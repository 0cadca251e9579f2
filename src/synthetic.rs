//! Ray-cast depth frames of simple scenes.
//!
//! Scene coordinates are the camera optical frame: x right, y down, z
//! forward, meters. The floor is the plane y = `camera_height`.

use serde::{Deserialize, Serialize};

use crate::types::{CameraIntrinsics, DepthFrame};

/// Axis-aligned box in the optical frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl SceneBox {
    /// Box standing on the floor.
    ///
    /// `lateral` is the x of its center, `near` the depth of its front face.
    pub fn on_floor(
        camera_height: f64,
        lateral: f64,
        near: f64,
        width: f64,
        length: f64,
        height: f64,
    ) -> SceneBox {
        SceneBox {
            min: [lateral - width / 2.0, camera_height - height, near],
            max: [lateral + width / 2.0, camera_height, near + length],
        }
    }

    /// Entry distance along `dir` (slab test), if hit in front of the camera.
    fn intersect(&self, dir: &[f64; 3]) -> Option<f64> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        for axis in 0..3 {
            if dir[axis] == 0.0 {
                if 0.0 < self.min[axis] || 0.0 > self.max[axis] {
                    return None;
                }
                continue;
            }
            let t0 = self.min[axis] / dir[axis];
            let t1 = self.max[axis] / dir[axis];
            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
        }
        if t_near <= t_far && t_near > 0.0 {
            Some(t_near)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Camera height above the floor; `None` for no floor.
    pub camera_height: Option<f64>,
    pub boxes: Vec<SceneBox>,
    /// Returns farther than this are reported as 0.
    pub max_range_mm: u16,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            camera_height: Some(0.6),
            boxes: Vec::new(),
            max_range_mm: 10000,
        }
    }
}

impl Scene {
    pub fn with_box(mut self, b: SceneBox) -> Scene {
        self.boxes.push(b);
        self
    }

    /// Depth (z) of the first surface along pixel (u, v), meters.
    fn depth_at(&self, u: u32, v: u32, k: &CameraIntrinsics) -> Option<f64> {
        // dir has z = 1, so ray parameter t equals depth
        let dir = [(u as f64 - k.cx) / k.fx, (v as f64 - k.cy) / k.fy, 1.0];
        let floor = self
            .camera_height
            .filter(|_| dir[1] > 0.0)
            .map(|h| h / dir[1]);
        self.boxes
            .iter()
            .filter_map(|b| b.intersect(&dir))
            .chain(floor)
            .min_by(f64::total_cmp)
    }

    pub fn render(&self, intrinsics: &CameraIntrinsics, time_ns: i64) -> DepthFrame {
        let mut depths_mm = Vec::with_capacity(intrinsics.width as usize * intrinsics.height as usize);
        for v in 0..intrinsics.height {
            for u in 0..intrinsics.width {
                let mm = self
                    .depth_at(u, v, intrinsics)
                    .map(|d| (d * 1000.0).round())
                    .filter(|mm| *mm <= self.max_range_mm as f64)
                    .map_or(0, |mm| mm as u16);
                depths_mm.push(mm);
            }
        }
        DepthFrame {
            width: intrinsics.width,
            height: intrinsics.height,
            depths_mm,
            time_ns,
        }
    }
}
