//! Rotation estimation from a least-squares conic fit.
//!
//! Contour points are fitted with a general conic (algebraic distance,
//! normalized coordinates); when the result is an ellipse the major-axis
//! angle is returned. Any failure - too few points, degenerate geometry,
//! a non-ellipse conic - yields `None` and the caller falls back to zero.

use nalgebra::{DMatrix, SymmetricEigen};

const MIN_POINTS: usize = 5;

/// Major-axis angle in degrees, in `[0, 180)`, of the best-fit ellipse.
pub fn rotation_degrees(points: &[(f64, f64)]) -> Option<f32> {
    let n = points.len();
    if n < MIN_POINTS {
        return None;
    }

    // Normalize for conditioning: shift to the centroid, scale so the mean
    // distance from it is sqrt(2). Translation and uniform scaling leave
    // the axis angle unchanged.
    let inv_n = 1.0 / n as f64;
    let mean_x: f64 = points.iter().map(|p| p.0).sum::<f64>() * inv_n;
    let mean_y: f64 = points.iter().map(|p| p.1).sum::<f64>() * inv_n;
    let mean_dist: f64 = points
        .iter()
        .map(|p| ((p.0 - mean_x).powi(2) + (p.1 - mean_y).powi(2)).sqrt())
        .sum::<f64>()
        * inv_n;
    if mean_dist < 1e-12 {
        return None;
    }
    let scale = std::f64::consts::SQRT_2 / mean_dist;

    // Design matrix rows [x^2, xy, y^2, x, y, 1]; the conic coefficients
    // are the null direction of D, taken from the smallest eigenpair of
    // the scatter matrix D^T D.
    let mut design = DMatrix::<f64>::zeros(n, 6);
    for (i, &(px, py)) in points.iter().enumerate() {
        let x = (px - mean_x) * scale;
        let y = (py - mean_y) * scale;
        design[(i, 0)] = x * x;
        design[(i, 1)] = x * y;
        design[(i, 2)] = y * y;
        design[(i, 3)] = x;
        design[(i, 4)] = y;
        design[(i, 5)] = 1.0;
    }
    let scatter = design.transpose() * &design;

    let eigen = SymmetricEigen::new(scatter);
    let mut min_i = 0;
    for i in 1..6 {
        if eigen.eigenvalues[i] < eigen.eigenvalues[min_i] {
            min_i = i;
        }
    }
    let conic = eigen.eigenvectors.column(min_i);
    let (a, b, c) = (conic[0], conic[1], conic[2]);

    // Ellipse condition on the quadratic part.
    if b * b - 4.0 * a * c >= 0.0 {
        return None;
    }

    // The principal axes are the eigenvectors of [[A, B/2], [B/2, C]]; the
    // major axis belongs to the smaller eigenvalue.
    // The eigenvector is unit norm, so the coefficients are bounded and an
    // absolute threshold separates fit noise from a real cross term.
    let lambda_min = 0.5 * (a + c) - (0.25 * (a - c).powi(2) + 0.25 * b * b).sqrt();
    let (vx, vy) = if b.abs() > 1e-9 {
        (0.5 * b, lambda_min - a)
    } else if a <= c {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    };

    let degrees = vy.atan2(vx).to_degrees().rem_euclid(180.0);
    Some(degrees as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ellipse_points(a: f64, b: f64, angle_deg: f64, count: usize) -> Vec<(f64, f64)> {
        let theta = angle_deg.to_radians();
        (0..count)
            .map(|i| {
                let phi = i as f64 / count as f64 * std::f64::consts::TAU;
                let x = a * phi.cos();
                let y = b * phi.sin();
                (
                    x * theta.cos() - y * theta.sin() + 100.0,
                    x * theta.sin() + y * theta.cos() + 100.0,
                )
            })
            .collect()
    }

    fn angle_close(actual: f32, expected: f32) -> bool {
        let diff = (actual - expected).rem_euclid(180.0);
        diff < 1.0 || diff > 179.0
    }

    #[test]
    fn test_axis_aligned_wide_ellipse() {
        let points = ellipse_points(40.0, 20.0, 0.0, 16);
        let angle = rotation_degrees(&points).unwrap();
        assert!(angle_close(angle, 0.0), "got {angle}");
    }

    #[test]
    fn test_axis_aligned_tall_ellipse() {
        let points = ellipse_points(20.0, 40.0, 0.0, 16);
        let angle = rotation_degrees(&points).unwrap();
        assert!(angle_close(angle, 90.0), "got {angle}");
    }

    #[test]
    fn test_rotated_ellipse() {
        let points = ellipse_points(40.0, 15.0, 30.0, 24);
        let angle = rotation_degrees(&points).unwrap();
        assert!(angle_close(angle, 30.0), "got {angle}");
    }

    #[test]
    fn test_too_few_points() {
        let points = ellipse_points(40.0, 20.0, 0.0, 4);
        assert!(rotation_degrees(&points).is_none());
    }

    #[test]
    fn test_collinear_points_rejected() {
        let points: Vec<_> = (0..8).map(|i| (i as f64, 2.0 * i as f64)).collect();
        assert!(rotation_degrees(&points).is_none());
    }

    #[test]
    fn test_coincident_points_rejected() {
        let points = vec![(3.0, 4.0); 8];
        assert!(rotation_degrees(&points).is_none());
    }
}
