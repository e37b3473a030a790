//! Contour extraction and polygon geometry.
//!
//! Areas and centroids are computed on the traced boundary polygon via
//! Green's theorem, matching the usual contour-moment definitions.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

/// Trace the external, top-level contours of a binary mask.
///
/// Contours nested inside other regions are dropped; the returned order is
/// the tracer's discovery order (row-major scan).
pub fn external_contours(mask: &GrayImage) -> Vec<Vec<(f64, f64)>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .map(|contour| {
            contour
                .points
                .iter()
                .map(|point| (point.x as f64, point.y as f64))
                .collect()
        })
        .collect()
}

/// First-order polygon moments of a closed contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl PolygonMoments {
    /// Unsigned polygon area.
    pub fn area(&self) -> f64 {
        self.m00.abs()
    }

    /// Centroid, or `None` for a degenerate (zero-area) contour.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 == 0.0 {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// Signed moments m00/m10/m01 over the closed polygon `points`.
pub fn polygon_moments(points: &[(f64, f64)]) -> PolygonMoments {
    let n = points.len();
    if n < 3 {
        return PolygonMoments {
            m00: 0.0,
            m10: 0.0,
            m01: 0.0,
        };
    }

    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        m00 += cross;
        m10 += (x0 + x1) * cross;
        m01 += (y0 + y1) * cross;
    }

    PolygonMoments {
        m00: m00 / 2.0,
        m10: m10 / 6.0,
        m01: m01 / 6.0,
    }
}
