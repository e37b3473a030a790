//! Camera capture module
//!
//! Wraps a capture device behind a synchronous frame source. Frames are
//! read on demand from the main loop; there is no capture thread. Every
//! frame is mirrored and conditioned for detection before it is handed out.

mod preprocess;

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while bringing up a capture device.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera {id} unavailable: {source}")]
    DeviceUnavailable {
        id: u32,
        #[source]
        source: nokhwa::NokhwaError,
    },
}

/// Capture device configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index passed to the capture backend
    pub camera_id: u32,
    /// Requested frame width in pixels
    pub frame_width: u32,
    /// Requested frame height in pixels
    pub frame_height: u32,
    /// Requested capture rate in frames per second
    pub requested_fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_id: 0,
            frame_width: 1280,
            frame_height: 720,
            requested_fps: 30,
        }
    }
}

/// Properties of the opened stream, which may differ from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraInfo {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// An attached capture device, as reported by the backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: u32,
    pub name: String,
}

/// Synchronous frame source over an optional camera handle.
///
/// Constructed disabled; `initialize` opens the device. A failed open
/// leaves the source disabled until `initialize` is called again, and a
/// disabled source returns `None` from every read.
pub struct FrameSource {
    config: CameraConfig,
    camera: Option<Camera>,
}

impl FrameSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            camera: None,
        }
    }

    /// Open the configured device and start streaming.
    ///
    /// Requests the configured resolution and frame rate; the backend picks
    /// the closest format it supports. There is no retry on failure.
    pub fn initialize(&mut self) -> Result<(), CameraError> {
        self.camera = None;

        let id = self.config.camera_id;
        let format = CameraFormat::new(
            Resolution::new(self.config.frame_width, self.config.frame_height),
            FrameFormat::MJPEG,
            self.config.requested_fps,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(id), requested)
            .map_err(|source| CameraError::DeviceUnavailable { id, source })?;
        camera
            .open_stream()
            .map_err(|source| CameraError::DeviceUnavailable { id, source })?;

        log::info!(
            "camera {} opened: {} ({}x{} @ {} fps)",
            id,
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height(),
            camera.frame_rate()
        );

        self.camera = Some(camera);
        Ok(())
    }

    /// Read, decode and condition one frame.
    ///
    /// Returns `None` when the source is disabled or the read fails; a
    /// failed read is transient and skips the caller's tick, nothing more.
    pub fn next_frame(&mut self) -> Option<RgbImage> {
        let camera = self.camera.as_mut()?;

        let buffer = match camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("frame read failed: {e}");
                return None;
            }
        };
        let frame = match buffer.decode_image::<RgbFormat>() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("frame decode failed: {e}");
                return None;
            }
        };

        Some(preprocess::condition_frame(frame))
    }

    /// Properties of the opened stream, `None` while disabled.
    pub fn info(&self) -> Option<CameraInfo> {
        self.camera.as_ref().map(|camera| CameraInfo {
            width: camera.resolution().width(),
            height: camera.resolution().height(),
            fps: camera.frame_rate(),
        })
    }

    pub fn is_available(&self) -> bool {
        self.camera.is_some()
    }

    /// Stop streaming and drop the device handle.
    pub fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("failed to stop camera stream: {e}");
            }
            log::info!("camera released");
        }
    }

    /// List attached capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
            Ok(devices) => devices
                .iter()
                .enumerate()
                .map(|(index, info)| DeviceInfo {
                    index: index as u32,
                    name: info.human_name().to_string(),
                })
                .collect(),
            Err(e) => {
                log::warn!("failed to enumerate cameras: {e}");
                Vec::new()
            }
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_device_reports_unavailable() {
        let config = CameraConfig {
            camera_id: 250,
            ..Default::default()
        };
        let mut source = FrameSource::new(config);

        let result = source.initialize();
        assert!(matches!(
            result,
            Err(CameraError::DeviceUnavailable { id: 250, .. })
        ));
        assert!(!source.is_available());

        // Disabled sources keep returning nothing instead of erroring.
        for _ in 0..3 {
            assert!(source.next_frame().is_none());
        }
        assert!(source.info().is_none());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut source = FrameSource::new(CameraConfig::default());
        source.release();
        source.release();
        assert!(!source.is_available());
    }
}
