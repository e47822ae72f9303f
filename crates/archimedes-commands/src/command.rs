use crate::blocked::BlockParams;
use crate::rectangles::{find_rectangular_boxes, BoxDetectParams};
use crate::segment::{filter_to_color, BandError, ColorBand};
use archimedes_core::PixelBounds;
use image::RgbImage;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Everything that configures one command besides its handler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandParams {
    pub band: ColorBand,
    #[serde(default)]
    pub boxes: BoxDetectParams,
    #[serde(default)]
    pub blocking: BlockParams,
}

impl CommandParams {
    pub fn new(band: ColorBand) -> Self {
        Self {
            band,
            boxes: BoxDetectParams::default(),
            blocking: BlockParams::default(),
        }
    }

    pub fn validate(&self) -> Result<(), BandError> {
        self.band.validate()
    }
}

/// A detected quadrilateral and its axis-aligned bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandBox {
    pub corners: [Point<i32>; 4],
    pub bounds: PixelBounds,
}

impl CommandBox {
    pub fn new(corners: [Point<i32>; 4]) -> Self {
        let xs = corners.map(|p| p.x);
        let ys = corners.map(|p| p.y);
        let bounds = PixelBounds::new(
            xs.into_iter().min().unwrap_or(0),
            xs.into_iter().max().unwrap_or(0),
            ys.into_iter().min().unwrap_or(0),
            ys.into_iter().max().unwrap_or(0),
        );
        Self { corners, bounds }
    }

    /// `image[y_min..y_max, x_min..x_max]`, `None` when empty.
    pub fn crop(&self, image: &RgbImage) -> Option<RgbImage> {
        self.bounds.crop(image)
    }
}

/// Segment `image` with `band` and extract its command boxes.
pub fn detect_command_boxes(
    image: &RgbImage,
    band: &ColorBand,
    params: &BoxDetectParams,
) -> Vec<CommandBox> {
    let mask = filter_to_color(image, band);
    find_rectangular_boxes(&mask, params)
        .into_iter()
        .map(CommandBox::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_hollow_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn box_bounds_and_crop() {
        let b = CommandBox::new([
            Point::new(12, 5),
            Point::new(30, 6),
            Point::new(29, 20),
            Point::new(11, 19),
        ]);
        assert_eq!(b.bounds, PixelBounds::new(11, 30, 5, 20));
        let img = RgbImage::new(25, 40);
        assert_eq!(b.crop(&img).map(|c| c.dimensions()), Some((14, 15)));
        assert!(CommandBox::new([Point::new(50, 50); 4]).crop(&img).is_none());
    }

    #[test]
    fn colored_outline_is_found_and_other_colors_ignored() {
        let mut img = RgbImage::from_pixel(240, 200, Rgb([250, 250, 250]));
        for inset in 0..5 {
            draw_hollow_rect_mut(
                &mut img,
                Rect::at(20 + inset, 20 + inset).of_size(90 - 2 * inset as u32, 80 - 2 * inset as u32),
                Rgb([30, 60, 220]),
            );
            draw_hollow_rect_mut(
                &mut img,
                Rect::at(130 + inset, 20 + inset).of_size(90 - 2 * inset as u32, 80 - 2 * inset as u32),
                Rgb([40, 200, 40]),
            );
        }

        let blue = detect_command_boxes(&img, &ColorBand::new(120), &BoxDetectParams::default());
        assert_eq!(blue.len(), 1);
        assert!(blue[0].bounds.x_max < 130);

        let green = detect_command_boxes(&img, &ColorBand::new(60), &BoxDetectParams::default());
        assert_eq!(green.len(), 1);
        assert!(green[0].bounds.x_min > 110);
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: CommandParams =
            serde_json::from_str(r#"{"band": {"target_hue": 120}, "blocking": {"cooldown_frames": 3}}"#)
                .expect("parse");
        assert_eq!(params.band, ColorBand::new(120));
        assert_eq!(params.boxes, BoxDetectParams::default());
        assert_eq!(params.blocking.cooldown_frames, 3);
        assert_eq!(params.blocking.clear_frames, 5);
    }
}
