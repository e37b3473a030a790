//! Hue/saturation/value conversion and in-range masking.
//!
//! Uses the 8-bit OpenCV conventions the color table is written in:
//! H in [0, 179] (degrees halved), S and V in [0, 255].

use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

/// Inclusive HSV bounds for one color class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBounds {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBounds {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

/// A frame converted to HSV planes, row-major.
pub struct HsvImage {
    width: u32,
    height: u32,
    data: Vec<[u8; 3]>,
}

impl HsvImage {
    pub fn from_rgb(frame: &RgbImage) -> Self {
        let (width, height) = frame.dimensions();
        let data = frame.pixels().map(|pixel| rgb_to_hsv(pixel.0)).collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Binary mask of the pixels inside `bounds` (255 in range, 0 outside).
    pub fn mask_in_range(&self, bounds: &HsvBounds) -> GrayImage {
        let mut mask = GrayImage::new(self.width, self.height);
        for (i, &hsv) in self.data.iter().enumerate() {
            if bounds.contains(hsv) {
                let x = i as u32 % self.width;
                let y = i as u32 / self.width;
                mask.put_pixel(x, y, Luma([255u8]));
            }
        }
        mask
    }
}

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let rf = r as f32;
    let gf = g as f32;
    let bf = b as f32;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };

    let mut h = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    // Hue is halved to fit 8 bits; 180 wraps back onto 0.
    let h8 = (h / 2.0).round() as u16 % 180;
    [h8 as u8, s.round() as u8, max as u8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
    }

    #[test]
    fn test_achromatic_pixels() {
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([255, 255, 255]), [0, 0, 255]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = HsvBounds {
            lower: [40, 50, 50],
            upper: [80, 255, 255],
        };
        assert!(bounds.contains([40, 50, 50]));
        assert!(bounds.contains([80, 255, 255]));
        assert!(!bounds.contains([39, 255, 255]));
        assert!(!bounds.contains([81, 255, 255]));
        assert!(!bounds.contains([60, 49, 255]));
    }

    #[test]
    fn test_mask_selects_matching_pixels() {
        let mut frame = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        frame.put_pixel(1, 2, Rgb([0, 255, 0]));
        frame.put_pixel(3, 3, Rgb([0, 255, 0]));

        let hsv = HsvImage::from_rgb(&frame);
        let mask = hsv.mask_in_range(&HsvBounds {
            lower: [40, 50, 50],
            upper: [80, 255, 255],
        });

        let lit: Vec<_> = mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] != 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(lit, vec![(1, 2), (3, 3)]);
    }
}
