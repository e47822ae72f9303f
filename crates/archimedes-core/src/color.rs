//! Hue/saturation/value conversion on the 8-bit OpenCV scale.
//!
//! Hue is stored as half-degrees in `[0, HUE_RANGE)`, saturation and value in
//! `[0, 255]`. Pen colors in configuration files are written on this scale
//! (blue ≈ 120, green ≈ 60, red ≈ 0).

use image::Rgb;
use serde::{Deserialize, Serialize};

/// Number of distinct hue values; hue arithmetic wraps modulo this.
pub const HUE_RANGE: i32 = 180;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// Inverse of [`rgb_to_hsv`], up to rounding.
    pub fn to_rgb(self) -> Rgb<u8> {
        let v = self.v as f32;
        let s = self.s as f32 / 255.0;
        let c = v * s;
        let hp = (self.h as f32 * 2.0) / 60.0;
        let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());
        let (r, g, b) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = v - c;
        let q = |u: f32| (u + m).round().clamp(0.0, 255.0) as u8;
        Rgb([q(r), q(g), q(b)])
    }
}

/// Convert one RGB pixel to HSV.
pub fn rgb_to_hsv(px: Rgb<u8>) -> Hsv {
    let [r, g, b] = px.0.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        ((diff as f32 * 255.0) / v as f32).round() as i32
    };

    let h = if diff == 0 {
        0.0
    } else {
        let d = diff as f32;
        let deg = if v == r {
            60.0 * (g - b) as f32 / d
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / d
        } else {
            240.0 + 60.0 * (r - g) as f32 / d
        };
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    };
    let h = ((h * 0.5).round() as i32).rem_euclid(HUE_RANGE);

    Hsv {
        h: h as u8,
        s: s.clamp(0, 255) as u8,
        v: v as u8,
    }
}

/// Shortest distance between two hues on the wrapped hue circle.
#[inline]
pub fn hue_distance(a: i32, b: i32) -> i32 {
    let d = (a - b).rem_euclid(HUE_RANGE);
    d.min(HUE_RANGE - d)
}
