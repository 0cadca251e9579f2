use crate::config::ObstacleBounds;
use crate::types::Point3;

impl ObstacleBounds {
    /// Whether `p` lies strictly inside the window above `ground`.
    pub fn contains(&self, p: &Point3, ground: f64) -> bool {
        p.y > ground + self.ground_margin
            && p.y < self.ceiling
            && p.z > self.forward_min
            && p.z < self.forward_max
    }
}

/// Keeps the outlier points that can be obstacles.
pub fn filter_obstacles(outliers: &[Point3], ground: f64, bounds: &ObstacleBounds) -> Vec<Point3> {
    let kept: Vec<Point3> = outliers
        .iter()
        .filter(|p| bounds.contains(p, ground))
        .copied()
        .collect();
    log::trace!("{} of {} outliers are obstacles", kept.len(), outliers.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_edges_are_exclusive() {
        let bounds = ObstacleBounds::default();
        let ground = -0.6;
        assert!(bounds.contains(&Point3::new(0.0, -0.3, -1.0), ground));
        // ground + margin
        assert!(!bounds.contains(&Point3::new(0.0, -0.4, -1.0), ground));
        assert!(!bounds.contains(&Point3::new(0.0, -0.1, -1.0), ground));
        assert!(!bounds.contains(&Point3::new(0.0, -0.3, -2.0), ground));
        assert!(!bounds.contains(&Point3::new(0.0, -0.3, -0.5), ground));
        // behind the camera
        assert!(!bounds.contains(&Point3::new(0.0, -0.3, 1.0), ground));
    }

    #[test]
    fn test_widening_bounds_never_drops_points() {
        let points: Vec<Point3> = (0..40)
            .flat_map(|i| {
                (0..40).map(move |j| Point3::new(0.0, -1.0 + i as f64 * 0.025, -2.5 + j as f64 * 0.06))
            })
            .collect();
        let ground = -0.7;
        let narrow = ObstacleBounds::default();
        let wide = ObstacleBounds {
            ground_margin: 0.1,
            ceiling: 0.0,
            forward_min: -2.4,
            forward_max: -0.3,
        };
        let kept_narrow = filter_obstacles(&points, ground, &narrow);
        let kept_wide = filter_obstacles(&points, ground, &wide);
        assert!(!kept_narrow.is_empty());
        assert!(kept_wide.len() > kept_narrow.len());
        for p in &kept_narrow {
            assert!(kept_wide.contains(p));
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_obstacles(&[], 0.0, &ObstacleBounds::default()).is_empty());
    }
}
