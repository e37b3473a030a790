//! Frame conditioning applied between capture and detection.
//!
//! Order matters: mirror flip first (so detection coordinates match what a
//! user facing the screen expects), then edge-preserving denoise, then a
//! linear contrast/brightness boost. The constants are fixed tuning, not
//! per-call knobs.

use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::bilateral_filter;

const BILATERAL_WINDOW: u32 = 9;
const BILATERAL_SIGMA_COLOR: f32 = 75.0;
const BILATERAL_SIGMA_SPATIAL: f32 = 75.0;

const CONTRAST_GAIN: f32 = 1.2;
const BRIGHTNESS_OFFSET: f32 = 10.0;

/// Mirror, denoise and contrast-stretch a raw camera frame.
pub fn condition_frame(frame: RgbImage) -> RgbImage {
    let mirrored = imageops::flip_horizontal(&frame);
    let denoised = denoise(&mirrored);
    adjust_contrast(denoised)
}

/// Bilateral smoothing. The filter is single-channel, so each color plane
/// is filtered independently and recombined.
fn denoise(frame: &RgbImage) -> RgbImage {
    let (width, height) = frame.dimensions();

    let mut planes = [
        GrayImage::new(width, height),
        GrayImage::new(width, height),
        GrayImage::new(width, height),
    ];
    for (x, y, pixel) in frame.enumerate_pixels() {
        for (channel, plane) in planes.iter_mut().enumerate() {
            plane.put_pixel(x, y, Luma([pixel[channel]]));
        }
    }

    let filtered: Vec<GrayImage> = planes
        .iter()
        .map(|plane| {
            bilateral_filter(
                plane,
                BILATERAL_WINDOW,
                BILATERAL_SIGMA_COLOR,
                BILATERAL_SIGMA_SPATIAL,
            )
        })
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            filtered[0].get_pixel(x, y)[0],
            filtered[1].get_pixel(x, y)[0],
            filtered[2].get_pixel(x, y)[0],
        ])
    })
}

/// Saturating linear map `v' = gain * v + offset` on every channel.
fn adjust_contrast(mut frame: RgbImage) -> RgbImage {
    for pixel in frame.pixels_mut() {
        for value in pixel.0.iter_mut() {
            *value = (*value as f32 * CONTRAST_GAIN + BRIGHTNESS_OFFSET)
                .round()
                .clamp(0.0, 255.0) as u8;
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_gain_and_offset() {
        let frame = RgbImage::from_pixel(4, 4, Rgb([100, 0, 250]));
        let out = adjust_contrast(frame);
        let pixel = out.get_pixel(0, 0);
        assert_eq!(pixel[0], 130); // 100 * 1.2 + 10
        assert_eq!(pixel[1], 10); // offset only
        assert_eq!(pixel[2], 255); // saturated
    }

    #[test]
    fn test_uniform_frame_passes_through_denoise() {
        let frame = RgbImage::from_pixel(16, 16, Rgb([100, 150, 200]));
        let out = denoise(&frame);
        assert_eq!(out.get_pixel(8, 8), &Rgb([100, 150, 200]));
    }

    #[test]
    fn test_condition_frame_mirrors_horizontally() {
        // Left half red, right half blue; after the flip the red half sits
        // on the right. Sample away from the seam so smoothing cannot bleed.
        let frame = RgbImage::from_fn(20, 20, |x, _| {
            if x < 10 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let out = condition_frame(frame);

        let right = out.get_pixel(18, 10);
        assert!(right[0] > right[2], "red half should be mirrored right");
        let left = out.get_pixel(1, 10);
        assert!(left[2] > left[0], "blue half should be mirrored left");
    }
}
