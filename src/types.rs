use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FrameError};

/// Camera-relative point in meters.
pub type Point3 = na::Vector3<f64>;

/// Pinhole intrinsics of the depth sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub width: u32,
    pub height: u32,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fx: 380.570,
            fy: 380.570,
            cx: 321.218,
            cy: 237.158,
        }
    }
}

impl CameraIntrinsics {
    pub fn new(width: u32, height: u32, fx: f64, fy: f64, cx: f64, cy: f64) -> CameraIntrinsics {
        CameraIntrinsics {
            width,
            height,
            fx,
            fy,
            cx,
            cy,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let focal_ok = |f: f64| f.is_finite() && f > 0.0;
        if !focal_ok(self.fx) || !focal_ok(self.fy) {
            return Err(ConfigError::InvalidFocalLength {
                fx: self.fx,
                fy: self.fy,
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidImageSize {
                width: self.width,
                height: self.height,
            });
        }
        if !self.cx.is_finite() || !self.cy.is_finite() {
            return Err(ConfigError::invalid(
                "intrinsics.cx/cy",
                "principal point must be finite",
            ));
        }
        Ok(())
    }
}

/// One depth image: row-major millimeter samples, 0 means no return.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    pub depths_mm: Vec<u16>,
    pub time_ns: i64,
}

impl DepthFrame {
    pub fn new(
        width: u32,
        height: u32,
        depths_mm: Vec<u16>,
        time_ns: i64,
    ) -> Result<DepthFrame, FrameError> {
        let expected = width as usize * height as usize;
        if depths_mm.len() != expected {
            return Err(FrameError::buffer_mismatch(expected, depths_mm.len()));
        }
        Ok(DepthFrame {
            width,
            height,
            depths_mm,
            time_ns,
        })
    }

    /// Frame with every pixel set to `depth_mm`.
    pub fn filled(width: u32, height: u32, depth_mm: u16, time_ns: i64) -> DepthFrame {
        DepthFrame {
            width,
            height,
            depths_mm: vec![depth_mm; width as usize * height as usize],
            time_ns,
        }
    }

    /// Decodes a transport image buffer.
    ///
    /// Accepts `16UC1` and `mono16`. Rows may be padded (`step` > width * 2);
    /// the padding is dropped.
    pub fn from_raw(raw: &RawDepthImage) -> Result<DepthFrame, FrameError> {
        match raw.encoding.as_str() {
            "16UC1" | "mono16" => {}
            other => return Err(FrameError::UnsupportedEncoding(other.to_string())),
        }
        let width = raw.width as usize;
        let height = raw.height as usize;
        let row_bytes = width * 2;
        if raw.step < row_bytes {
            return Err(FrameError::InvalidStep {
                step: raw.step,
                min: row_bytes,
            });
        }
        let expected = raw.step * height;
        if raw.data.len() != expected {
            return Err(FrameError::buffer_mismatch(expected, raw.data.len()));
        }

        let mut depths_mm = Vec::with_capacity(width * height);
        for row in raw.data.chunks_exact(raw.step) {
            depths_mm.extend(row[..row_bytes].chunks_exact(2).map(|b| {
                let bytes = [b[0], b[1]];
                if raw.is_bigendian {
                    u16::from_be_bytes(bytes)
                } else {
                    u16::from_le_bytes(bytes)
                }
            }));
        }
        DepthFrame::new(raw.width, raw.height, depths_mm, raw.time_ns)
    }

    pub fn depth_at(&self, u: u32, v: u32) -> Option<u16> {
        if u >= self.width || v >= self.height {
            return None;
        }
        self.depths_mm
            .get(v as usize * self.width as usize + u as usize)
            .copied()
    }
}

/// Image message as delivered by a camera driver.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDepthImage {
    pub width: u32,
    pub height: u32,
    pub encoding: String,
    pub is_bigendian: bool,
    /// Row length in bytes.
    pub step: usize,
    pub data: Vec<u8>,
    pub time_ns: i64,
}

/// Points plus the pixel each one was deprojected from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Point3>,
    pub pixels: Option<Vec<(u32, u32)>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3>) -> PointCloud {
        PointCloud {
            points,
            pixels: None,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Applies `rotation` about the origin to every point.
    pub fn rotate(&mut self, rotation: &na::Matrix3<f64>) {
        for p in self.points.iter_mut() {
            *p = rotation * *p;
        }
    }

    /// Splits into (selected, rest) by index, keeping pixel mappings aligned.
    ///
    /// `indices` must be sorted and in range.
    pub fn partition(&self, indices: &[usize]) -> (PointCloud, PointCloud) {
        let mut selected = vec![false; self.points.len()];
        for &i in indices {
            selected[i] = true;
        }
        let pick = |keep: bool| -> PointCloud {
            let points = self
                .points
                .iter()
                .zip(&selected)
                .filter(|(_, s)| **s == keep)
                .map(|(p, _)| *p)
                .collect();
            let pixels = self.pixels.as_ref().map(|px| {
                px.iter()
                    .zip(&selected)
                    .filter(|(_, s)| **s == keep)
                    .map(|(p, _)| *p)
                    .collect()
            });
            PointCloud { points, pixels }
        };
        (pick(true), pick(false))
    }
}

/// Plane ax + by + cz + d = 0 with unit normal (a, b, c).
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneModel {
    pub coefficients: na::Vector4<f64>,
    /// Sorted indices of inlier points in the fitted cloud.
    pub inliers: Vec<usize>,
}

impl PlaneModel {
    pub fn normal(&self) -> na::Vector3<f64> {
        self.coefficients.fixed_rows::<3>(0).into_owned()
    }

    pub fn distance(&self, p: &Point3) -> f64 {
        (self.normal().dot(p) + self.coefficients[3]).abs()
    }
}
