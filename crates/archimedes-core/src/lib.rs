//! Core types and utilities for whiteboard command detection.
//!
//! This crate is small and purely geometric: homographies and perspective
//! warping, OpenCV-scale HSV conversion, integer pixel rectangles, and a
//! minimal logger. Image buffers are plain `image::RgbImage` values.

mod bounds;
mod color;
mod homography;
mod logger;
mod sampling;

pub use bounds::PixelBounds;
pub use color::{hue_distance, rgb_to_hsv, Hsv, HUE_RANGE};
pub use homography::{homography_from_4pt, warp_perspective_rgb, Homography};
pub use sampling::sample_bilinear_rgb;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_ENV_VAR};

/// Solid white, used to erase marker glyphs and blocked regions.
pub const WHITE: image::Rgb<u8> = image::Rgb([255, 255, 255]);
