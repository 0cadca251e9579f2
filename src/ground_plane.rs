//! RANSAC ground plane segmentation and alignment of the cloud to it.
//!
//! The fitted plane's normal is rotated onto the canonical up axis (0, 1, 0)
//! so that downstream stages can treat y as height above the floor.

use nalgebra as na;
use rand::Rng;
use rand::seq::index;

use crate::config::PlaneFitConfig;
use crate::types::{PlaneModel, Point3, PointCloud};

/// Points needed to define a candidate plane.
const RANSAC_N: usize = 3;

/// Result of ground segmentation on one cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundSegmentation {
    /// `None` when the cloud is too small or every sample was degenerate.
    pub plane: Option<PlaneModel>,
    /// Rotation applied to both subsets; `None` if alignment was skipped.
    pub rotation: Option<na::Matrix3<f64>>,
    pub inliers: PointCloud,
    pub outliers: PointCloud,
}

/// Fits the dominant plane, aligns the cloud to it and splits it into
/// inliers and outliers.
pub fn segment_ground<R: Rng + ?Sized>(
    cloud: &PointCloud,
    config: &PlaneFitConfig,
    rng: &mut R,
) -> GroundSegmentation {
    let plane = fit_plane(&cloud.points, config, rng);
    let mut aligned = cloud.clone();
    let rotation = plane
        .as_ref()
        .and_then(|p| alignment_rotation(&p.normal()));
    if let Some(r) = &rotation {
        aligned.rotate(r);
    }
    let (inliers, outliers) = match &plane {
        Some(p) => aligned.partition(&p.inliers),
        None => {
            log::debug!(
                "no ground plane in {} points, treating all as outliers",
                cloud.len()
            );
            (PointCloud::default(), aligned)
        }
    };
    GroundSegmentation {
        plane,
        rotation,
        inliers,
        outliers,
    }
}

/// Plane through three points, `None` for collinear samples.
fn plane_from_triangle(p0: &Point3, p1: &Point3, p2: &Point3) -> Option<na::Vector4<f64>> {
    let normal = (p1 - p0).cross(&(p2 - p0));
    let norm = normal.norm();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    let n = normal / norm;
    Some(na::Vector4::new(n.x, n.y, n.z, -n.dot(p0)))
}

/// Least-squares plane over `indices`.
///
/// Solves along the axis with the largest covariance determinant, so the
/// normal's component on that axis is positive.
fn plane_from_points(points: &[Point3], indices: &[usize]) -> Option<na::Vector4<f64>> {
    if indices.len() < RANSAC_N {
        return None;
    }
    let n = indices.len() as f64;
    let centroid = indices.iter().map(|&i| points[i]).sum::<Point3>() / n;
    let (mut xx, mut xy, mut xz, mut yy, mut yz, mut zz) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for &i in indices {
        let r = points[i] - centroid;
        xx += r.x * r.x;
        xy += r.x * r.y;
        xz += r.x * r.z;
        yy += r.y * r.y;
        yz += r.y * r.z;
        zz += r.z * r.z;
    }
    let det_x = yy * zz - yz * yz;
    let det_y = xx * zz - xz * xz;
    let det_z = xx * yy - xy * xy;
    let abc = if det_x > det_y && det_x > det_z {
        na::Vector3::new(det_x, xz * yz - xy * zz, xy * yz - xz * yy)
    } else if det_y > det_z {
        na::Vector3::new(xz * yz - xy * zz, det_y, xy * xz - yz * xx)
    } else {
        na::Vector3::new(xy * yz - xz * yy, xy * xz - yz * xx, det_z)
    };
    let norm = abc.norm();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    let abc = abc / norm;
    Some(na::Vector4::new(abc.x, abc.y, abc.z, -abc.dot(&centroid)))
}

fn plane_distance(plane: &na::Vector4<f64>, p: &Point3) -> f64 {
    (plane.x * p.x + plane.y * p.y + plane.z * p.z + plane.w).abs()
}

/// (inlier count, inlier rmse) of `plane` over `points`.
fn evaluate(points: &[Point3], plane: &na::Vector4<f64>, threshold: f64) -> (usize, f64) {
    let mut count = 0;
    let mut sq_sum = 0.0;
    for p in points {
        let d = plane_distance(plane, p);
        if d < threshold {
            count += 1;
            sq_sum += d * d;
        }
    }
    let rmse = if count == 0 {
        0.0
    } else {
        (sq_sum / count as f64).sqrt()
    };
    (count, rmse)
}

fn collect_inliers(points: &[Point3], plane: &na::Vector4<f64>, threshold: f64) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| plane_distance(plane, p) < threshold)
        .map(|(i, _)| i)
        .collect()
}

/// RANSAC plane fit with a fixed iteration budget.
///
/// The winning candidate has the most inliers; ties go to the lower inlier
/// RMSE. The winner is refined by a least-squares fit over its inliers.
pub fn fit_plane<R: Rng + ?Sized>(
    points: &[Point3],
    config: &PlaneFitConfig,
    rng: &mut R,
) -> Option<PlaneModel> {
    if points.len() < RANSAC_N {
        return None;
    }
    let threshold = config.distance_threshold;
    let mut best: Option<(na::Vector4<f64>, usize, f64)> = None;
    for _ in 0..config.iterations {
        let sample = index::sample(rng, points.len(), RANSAC_N);
        let Some(candidate) = plane_from_triangle(
            &points[sample.index(0)],
            &points[sample.index(1)],
            &points[sample.index(2)],
        ) else {
            continue;
        };
        let (count, rmse) = evaluate(points, &candidate, threshold);
        let better = match &best {
            None => true,
            Some((_, best_count, best_rmse)) => {
                count > *best_count || (count == *best_count && rmse < *best_rmse)
            }
        };
        if better {
            best = Some((candidate, count, rmse));
        }
    }

    let (mut coefficients, _, _) = best?;
    let mut inliers = collect_inliers(points, &coefficients, threshold);
    if let Some(refined) = plane_from_points(points, &inliers) {
        coefficients = refined;
        inliers = collect_inliers(points, &coefficients, threshold);
    }
    log::trace!(
        "plane {:?} with {} / {} inliers",
        coefficients.as_slice(),
        inliers.len(),
        points.len()
    );
    Some(PlaneModel {
        coefficients,
        inliers,
    })
}

/// Rotation taking `normal` onto (0, 1, 0) via the Rodrigues formula.
///
/// Returns `None` when the normal is parallel or anti-parallel to the up
/// axis; the anti-parallel case is not corrected.
pub fn alignment_rotation(normal: &na::Vector3<f64>) -> Option<na::Matrix3<f64>> {
    let up = na::Vector3::y();
    let v = normal.cross(&up);
    let s = v.norm();
    let c = normal.dot(&up);
    if s == 0.0 {
        return None;
    }
    let vx = v.cross_matrix();
    Some(na::Matrix3::identity() + vx + vx * vx * ((1.0 - c) / (s * s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tilted_plane_points() -> Vec<Point3> {
        // y = -0.5 + 0.1 x - 0.05 z
        let mut points = Vec::new();
        for i in 0..30 {
            for j in 0..30 {
                let x = -1.5 + i as f64 * 0.1;
                let z = -0.5 - j as f64 * 0.1;
                points.push(Point3::new(x, -0.5 + 0.1 * x - 0.05 * z, z));
            }
        }
        points
    }

    #[test]
    fn test_exact_plane_all_inliers() {
        let points = tilted_plane_points();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let plane = fit_plane(&points, &PlaneFitConfig::default(), &mut rng).unwrap();
        assert_eq!(plane.inliers.len(), points.len());

        let expected = na::Vector3::new(-0.1, 1.0, 0.05).normalize();
        let n = plane.normal();
        assert!((n.norm() - 1.0).abs() < 1e-9);
        assert!((n.dot(&expected).abs() - 1.0).abs() < 1e-9, "normal {n:?}");
        for p in &points {
            assert!(plane.distance(p) < 1e-9);
        }
    }

    #[test]
    fn test_too_few_points() {
        let points = vec![Point3::zeros(), Point3::x()];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(fit_plane(&points, &PlaneFitConfig::default(), &mut rng).is_none());

        let cloud = PointCloud::new(points);
        let seg = segment_ground(&cloud, &PlaneFitConfig::default(), &mut rng);
        assert!(seg.plane.is_none());
        assert!(seg.rotation.is_none());
        assert!(seg.inliers.is_empty());
        assert_eq!(seg.outliers, cloud);
    }

    #[test]
    fn test_collinear_points_have_no_plane() {
        let points: Vec<_> = (0..10).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(fit_plane(&points, &PlaneFitConfig::default(), &mut rng).is_none());
    }

    #[test]
    fn test_same_seed_same_plane() {
        let mut points = tilted_plane_points();
        points.extend((0..200).map(|i| Point3::new(0.01 * i as f64, 0.3, -1.0 - 0.002 * i as f64)));
        let config = PlaneFitConfig::default();
        let a = fit_plane(&points, &config, &mut ChaCha8Rng::seed_from_u64(11));
        let b = fit_plane(&points, &config, &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_alignment_maps_normal_to_up() {
        let normal = na::Vector3::new(0.2, 0.9, -0.3).normalize();
        let r = alignment_rotation(&normal).unwrap();
        let aligned = r * normal;
        assert!((aligned - na::Vector3::y()).norm() < 1e-9);
        // proper rotation
        assert!((r.determinant() - 1.0).abs() < 1e-9);
        assert!((r * r.transpose() - na::Matrix3::identity()).norm() < 1e-9);
    }

    #[test]
    fn test_alignment_skipped_when_parallel() {
        assert!(alignment_rotation(&na::Vector3::y()).is_none());
        assert!(alignment_rotation(&-na::Vector3::y()).is_none());
    }

    #[test]
    fn test_segmentation_levels_the_floor() {
        let points = tilted_plane_points();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let seg = segment_ground(&PointCloud::new(points), &PlaneFitConfig::default(), &mut rng);
        assert!(seg.rotation.is_some());
        assert!(seg.outliers.is_empty());
        let ys: Vec<f64> = seg.inliers.points.iter().map(|p| p.y).collect();
        let spread = ys.iter().cloned().fold(f64::MIN, f64::max)
            - ys.iter().cloned().fold(f64::MAX, f64::min);
        assert!(spread < 1e-9, "floor not level: spread {spread}");
    }
}
