use crate::types::Point3;

/// Ground height used when no inliers are available.
pub const DEFAULT_GROUND_HEIGHT: f64 = 0.0;

/// Median y of the ground inliers.
///
/// Even counts average the two middle values; an empty set yields
/// [`DEFAULT_GROUND_HEIGHT`].
pub fn ground_reference(inliers: &[Point3]) -> f64 {
    if inliers.is_empty() {
        log::debug!("no ground inliers, using default ground height");
        return DEFAULT_GROUND_HEIGHT;
    }
    let mut ys: Vec<f64> = inliers.iter().map(|p| p.y).collect();
    ys.sort_by(f64::total_cmp);
    let mid = ys.len() / 2;
    if ys.len() % 2 == 0 {
        (ys[mid - 1] + ys[mid]) / 2.0
    } else {
        ys[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_heights(ys: &[f64]) -> Vec<Point3> {
        ys.iter().map(|&y| Point3::new(1.0, y, -1.0)).collect()
    }

    #[test]
    fn test_odd_count() {
        assert_eq!(ground_reference(&at_heights(&[-0.3, -0.7, -0.5])), -0.5);
    }

    #[test]
    fn test_even_count() {
        let h = ground_reference(&at_heights(&[-0.2, -0.8, -0.4, -0.6]));
        assert!((h + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_defaults_to_zero() {
        assert_eq!(ground_reference(&[]), DEFAULT_GROUND_HEIGHT);
    }
}
