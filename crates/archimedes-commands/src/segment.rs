//! Hue/saturation/value band segmentation.

use archimedes_core::{hue_distance, rgb_to_hsv, Hsv, HUE_RANGE};
use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Mask value of an in-band pixel.
pub const MASK_ON: u8 = 255;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandError {
    #[error("target hue {0} outside [0, 180)")]
    HueOutOfRange(u8),
    #[error("min_saturation must be positive, otherwise white and grey count as colored")]
    ZeroSaturationFloor,
}

/// A hue window with saturation and value floors, on the OpenCV 8-bit
/// scale.
///
/// A pixel is in the band when its hue is within `tol_hue` of `target_hue`
/// on the wrapped hue circle (both ends inclusive) and its saturation and
/// value reach the floors. With `target_hue = 5, tol_hue = 35` the band
/// covers hues `150..=179` and `0..=40`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBand {
    pub target_hue: u8,
    #[serde(default = "default_tol_hue")]
    pub tol_hue: u8,
    #[serde(default = "default_min_saturation")]
    pub min_saturation: u8,
    #[serde(default = "default_min_value")]
    pub min_value: u8,
}

fn default_tol_hue() -> u8 {
    35
}

fn default_min_saturation() -> u8 {
    10
}

fn default_min_value() -> u8 {
    50
}

impl ColorBand {
    /// Band around `target_hue` with default tolerance and floors.
    pub fn new(target_hue: u8) -> Self {
        Self {
            target_hue,
            tol_hue: default_tol_hue(),
            min_saturation: default_min_saturation(),
            min_value: default_min_value(),
        }
    }

    pub fn with_tolerance(mut self, tol_hue: u8) -> Self {
        self.tol_hue = tol_hue;
        self
    }

    pub fn with_floors(mut self, min_saturation: u8, min_value: u8) -> Self {
        self.min_saturation = min_saturation;
        self.min_value = min_value;
        self
    }

    pub fn validate(&self) -> Result<(), BandError> {
        if i32::from(self.target_hue) >= HUE_RANGE {
            return Err(BandError::HueOutOfRange(self.target_hue));
        }
        if self.min_saturation == 0 {
            return Err(BandError::ZeroSaturationFloor);
        }
        Ok(())
    }

    #[inline]
    pub fn contains(&self, px: Hsv) -> bool {
        px.s >= self.min_saturation
            && px.v >= self.min_value
            && hue_distance(i32::from(px.h), i32::from(self.target_hue)) <= i32::from(self.tol_hue)
    }
}

/// Binary mask of the pixels of `image` inside `band` (255 in band, 0
/// elsewhere).
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(image), fields(width = image.width(), height = image.height()))
)]
pub fn filter_to_color(image: &RgbImage, band: &ColorBand) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let on = band.contains(rgb_to_hsv(*image.get_pixel(x, y)));
        Luma([if on { MASK_ON } else { 0 }])
    })
}

/// Whether any pixel of the inclusive square `[cx - r, cx + r]²` lies in
/// `band`. The square is clipped to the image.
pub fn any_in_band(image: &RgbImage, band: &ColorBand, cx: i32, cy: i32, r: i32) -> bool {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let x0 = cx.saturating_sub(r).max(0);
    let x1 = cx.saturating_add(r).min(w - 1);
    let y0 = cy.saturating_sub(r).max(0);
    let y1 = cy.saturating_add(r).min(h - 1);
    (y0..=y1).any(|y| {
        (x0..=x1).any(|x| band.contains(rgb_to_hsv(*image.get_pixel(x as u32, y as u32))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn single(px: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(1, 1, px)
    }

    fn set_at_hue(band: &ColorBand, hue: u8) -> bool {
        let img = single(Hsv::new(hue, 255, 255).to_rgb());
        filter_to_color(&img, band).get_pixel(0, 0)[0] == MASK_ON
    }

    #[test]
    fn hue_band_edges_are_inclusive() {
        let band = ColorBand::new(120);
        for h in [85, 120, 155] {
            assert!(set_at_hue(&band, h), "hue {h} should be in band");
        }
        for h in [84, 156] {
            assert!(!set_at_hue(&band, h), "hue {h} should be out of band");
        }
    }

    #[test]
    fn band_below_zero_wraps_to_the_top_of_the_range() {
        let band = ColorBand::new(5);
        for h in [0, 5, 40, 150, 179] {
            assert!(set_at_hue(&band, h), "hue {h} should be in band");
        }
        for h in [41, 149] {
            assert!(!set_at_hue(&band, h), "hue {h} should be out of band");
        }
    }

    #[test]
    fn band_above_max_wraps_to_zero() {
        let band = ColorBand::new(175).with_tolerance(10);
        for h in [165, 179, 0, 5] {
            assert!(set_at_hue(&band, h), "hue {h} should be in band");
        }
        for h in [6, 164] {
            assert!(!set_at_hue(&band, h), "hue {h} should be out of band");
        }
    }

    #[test]
    fn saturation_and_value_floors_are_inclusive() {
        let band = ColorBand::new(0).with_floors(10, 51);
        // v = 51, s = round(2 * 255 / 51) = 10, h = 0
        assert_eq!(rgb_to_hsv(Rgb([51, 49, 49])), Hsv::new(0, 10, 51));
        assert!(band.contains(rgb_to_hsv(Rgb([51, 49, 49]))));
        // one unit below the value floor
        assert!(!band.contains(rgb_to_hsv(Rgb([50, 48, 48]))));
        // saturation 5
        assert!(!band.contains(rgb_to_hsv(Rgb([51, 50, 50]))));
    }

    #[test]
    fn white_is_never_in_a_valid_band() {
        for hue in [0, 30, 60, 120, 179] {
            let band = ColorBand::new(hue).with_floors(1, 0);
            band.validate().expect("valid");
            let white = filter_to_color(&single(Rgb([255, 255, 255])), &band);
            assert_eq!(white.get_pixel(0, 0)[0], 0);
        }
    }

    #[test]
    fn validation_rejects_bad_bands() {
        assert_eq!(
            ColorBand::new(180).validate(),
            Err(BandError::HueOutOfRange(180))
        );
        assert_eq!(
            ColorBand::new(60).with_floors(0, 50).validate(),
            Err(BandError::ZeroSaturationFloor)
        );
        assert!(ColorBand::new(60).validate().is_ok());
    }

    #[test]
    fn band_defaults_apply_when_deserializing() {
        let band: ColorBand = serde_json::from_str(r#"{"target_hue": 60}"#).expect("parse");
        assert_eq!(band, ColorBand::new(60));
        assert_eq!((band.tol_hue, band.min_saturation, band.min_value), (35, 10, 50));
    }

    #[test]
    fn corner_patch_is_clipped_to_the_image() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        img.put_pixel(9, 9, Rgb([0, 0, 255]));
        let band = ColorBand::new(120);
        assert!(any_in_band(&img, &band, 12, 12, 3));
        assert!(!any_in_band(&img, &band, 12, 12, 2));
        assert!(!any_in_band(&img, &band, 0, 0, 5));
    }
}
