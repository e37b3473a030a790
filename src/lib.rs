//! Tangible Table - camera-driven tabletop demo
//!
//! Captures a camera feed, segments colored physical markers per frame
//! (HSV thresholding, contour analysis), and renders an animated circular
//! table view with glowing markers and connection lines at a fixed tick
//! rate.

pub mod app;
pub mod camera;
pub mod config;
pub mod detect;
pub mod scene;

pub use app::App;
pub use config::AppConfig;
