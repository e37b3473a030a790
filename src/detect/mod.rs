//! Marker detection
//!
//! Per-frame color segmentation pipeline: HSV thresholding per color class,
//! morphological cleanup, external contour tracing, then centroid/rotation
//! estimation. The marker store is rebuilt from scratch on every call -
//! identities do not survive across frames.

mod contour;
mod ellipse;
mod hsv;

use image::RgbImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use serde::{Deserialize, Serialize};

pub use hsv::HsvBounds;

/// Side length of the square structuring element used for mask cleanup.
/// `Norm::LInf` with k=2 spans 5x5 pixels.
const MORPH_RADIUS: u8 = 2;

/// The closed set of recognizable marker categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerClass {
    GreenCube,
    RedCube,
    BlueCube,
}

impl MarkerClass {
    /// Human-readable label for on-screen listings.
    pub fn label(self) -> &'static str {
        match self {
            MarkerClass::GreenCube => "green cube",
            MarkerClass::RedCube => "red cube",
            MarkerClass::BlueCube => "blue cube",
        }
    }
}

/// One detected marker. Rebuilt every detection pass; `id` is only unique
/// within the pass that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub id: u32,
    /// Contour centroid in frame pixels.
    pub position: (i32, i32),
    /// Major-axis angle of the best-fit ellipse, degrees in [0, 180).
    pub rotation: f32,
    pub class: MarkerClass,
    /// Detected area relative to the maximum expected area, clamped to 1.
    pub confidence: f32,
}

/// One row of the color table: a category and its HSV range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorClassDef {
    pub class: MarkerClass,
    pub bounds: HsvBounds,
}

/// Detector tuning. The color table is plain data so tests can inject
/// synthetic ranges without touching the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Contours with polygon area at or below this are discarded (px^2).
    pub min_contour_area: f64,
    /// Contours with polygon area at or above this are discarded (px^2).
    pub max_contour_area: f64,
    /// Color classes, scanned in declaration order.
    pub color_classes: Vec<ColorClassDef>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_contour_area: 500.0,
            max_contour_area: 5000.0,
            color_classes: vec![
                ColorClassDef {
                    class: MarkerClass::GreenCube,
                    bounds: HsvBounds {
                        lower: [40, 50, 50],
                        upper: [80, 255, 255],
                    },
                },
                ColorClassDef {
                    class: MarkerClass::RedCube,
                    bounds: HsvBounds {
                        lower: [0, 50, 50],
                        upper: [10, 255, 255],
                    },
                },
                ColorClassDef {
                    class: MarkerClass::BlueCube,
                    bounds: HsvBounds {
                        lower: [100, 50, 50],
                        upper: [130, 255, 255],
                    },
                },
            ],
        }
    }
}

/// Per-frame marker detector.
///
/// Owns the current marker set; `detect` clears and repopulates it, so the
/// result of one call is only valid until the next.
pub struct MarkerDetector {
    config: DetectorConfig,
    markers: Vec<Marker>,
}

impl MarkerDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            markers: Vec::new(),
        }
    }

    /// Run the detection pipeline on one frame.
    ///
    /// Returns markers in discovery order: color classes in table order,
    /// contours in tracer order within each class. Overlapping classes can
    /// report near-co-located markers; no deduplication is applied.
    pub fn detect(&mut self, frame: &RgbImage) -> &[Marker] {
        self.markers.clear();
        if frame.width() == 0 || frame.height() == 0 {
            return &self.markers;
        }

        let hsv = hsv::HsvImage::from_rgb(frame);
        let mut next_id = 0u32;

        for def in &self.config.color_classes {
            let mask = hsv.mask_in_range(&def.bounds);
            // Open removes speckle noise, close fills small holes.
            let mask = close(&open(&mask, Norm::LInf, MORPH_RADIUS), Norm::LInf, MORPH_RADIUS);

            for points in contour::external_contours(&mask) {
                let moments = contour::polygon_moments(&points);
                let area = moments.area();
                if area <= self.config.min_contour_area || area >= self.config.max_contour_area {
                    continue;
                }
                let Some((cx, cy)) = moments.centroid() else {
                    continue;
                };

                let rotation = ellipse::rotation_degrees(&points).unwrap_or(0.0);
                let confidence = (area / self.config.max_contour_area).min(1.0) as f32;

                self.markers.push(Marker {
                    id: next_id,
                    position: (cx as i32, cy as i32),
                    rotation,
                    class: def.class,
                    confidence,
                });
                next_id += 1;
            }
        }

        log::debug!("detected {} markers", self.markers.len());
        &self.markers
    }

    /// The marker set from the most recent `detect` call.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// The marker closest to `(x, y)`, provided its distance is strictly
    /// below `threshold`. Ties go to the first marker encountered.
    pub fn find_nearest(&self, x: i32, y: i32, threshold: f64) -> Option<&Marker> {
        let mut best = None;
        let mut best_dist = f64::INFINITY;
        for marker in &self.markers {
            let dx = (marker.position.0 - x) as f64;
            let dy = (marker.position.1 - y) as f64;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < best_dist && dist < threshold {
                best_dist = dist;
                best = Some(marker);
            }
        }
        best
    }
}
