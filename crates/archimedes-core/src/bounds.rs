use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned integer rectangle in pixel coordinates.
///
/// Both `*_min` and `*_max` are pixel indices. [`PixelBounds::fill`] treats
/// the rectangle as inclusive of its max edge, [`PixelBounds::crop`] as
/// exclusive (slice semantics).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBounds {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl PixelBounds {
    pub const fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Tight bounds of integer points. `None` for an empty iterator.
    pub fn from_pixels<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let init = Self::new(x0, x0, y0, y0);
        Some(it.fold(init, |b, (x, y)| Self {
            x_min: b.x_min.min(x),
            x_max: b.x_max.max(x),
            y_min: b.y_min.min(y),
            y_max: b.y_max.max(y),
        }))
    }

    /// Bounds of sub-pixel points, truncated towards negative infinity.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2<f32>>,
    {
        Self::from_pixels(
            points
                .into_iter()
                .map(|p| (p.x.floor() as i32, p.y.floor() as i32)),
        )
    }

    /// Bounds of a quadrilateral given by its four corners.
    pub fn from_quad(corners: &[Point2<f32>; 4]) -> Self {
        let xs = corners.map(|p| p.x.floor() as i32);
        let ys = corners.map(|p| p.y.floor() as i32);
        Self {
            x_min: xs.into_iter().min().unwrap_or(0),
            x_max: xs.into_iter().max().unwrap_or(0),
            y_min: ys.into_iter().min().unwrap_or(0),
            y_max: ys.into_iter().max().unwrap_or(0),
        }
    }

    pub fn union(&self, other: &PixelBounds) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            x_max: self.x_max.max(other.x_max),
            y_min: self.y_min.min(other.y_min),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Grow by `margin` pixels on every side, saturating at the `i32` range.
    pub fn expanded(&self, margin: i32) -> Self {
        Self {
            x_min: self.x_min.saturating_sub(margin),
            x_max: self.x_max.saturating_add(margin),
            y_min: self.y_min.saturating_sub(margin),
            y_max: self.y_max.saturating_add(margin),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// `image[y_min..y_max, x_min..x_max]`, clamped to the image.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the image.
    pub fn crop(&self, image: &RgbImage) -> Option<RgbImage> {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let x0 = self.x_min.clamp(0, w);
        let x1 = self.x_max.clamp(0, w);
        let y0 = self.y_min.clamp(0, h);
        let y1 = self.y_max.clamp(0, h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(
            imageops::crop_imm(
                image,
                x0 as u32,
                y0 as u32,
                (x1 - x0) as u32,
                (y1 - y0) as u32,
            )
            .to_image(),
        )
    }

    /// Paint the rectangle, max edges included. Parts outside the image are
    /// ignored.
    pub fn fill(&self, image: &mut RgbImage, color: Rgb<u8>) {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let x0 = self.x_min.max(0);
        let x1 = self.x_max.min(w - 1);
        let y0 = self.y_min.max(0);
        let y1 = self.y_max.min(h - 1);
        if x1 < x0 || y1 < y0 {
            return;
        }
        let rect = Rect::at(x0, y0).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
        draw_filled_rect_mut(image, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn bounds_of_points_truncate() {
        let pts = [
            Point2::new(10.7_f32, 3.2),
            Point2::new(2.1, 8.9),
            Point2::new(5.0, 5.0),
        ];
        let b = PixelBounds::from_points(&pts).expect("non-empty");
        assert_eq!(b, PixelBounds::new(2, 10, 3, 8));
        assert!(PixelBounds::from_points(&[]).is_none());
    }

    #[test]
    fn crop_is_max_exclusive_and_clamped() {
        let mut img = RgbImage::new(10, 10);
        img.put_pixel(2, 3, Rgb([1, 2, 3]));
        let out = PixelBounds::new(2, 6, 3, 5).crop(&img).expect("inside");
        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(out.get_pixel(0, 0), &Rgb([1, 2, 3]));

        let clamped = PixelBounds::new(-4, 3, 8, 40).crop(&img).expect("partly inside");
        assert_eq!(clamped.dimensions(), (3, 2));

        assert!(PixelBounds::new(20, 30, 0, 5).crop(&img).is_none());
    }

    #[test]
    fn fill_includes_max_edge_and_clips() {
        let mut img = RgbImage::new(6, 6);
        PixelBounds::new(1, 3, 1, 2).expanded(1).fill(&mut img, WHITE);
        assert_eq!(img.get_pixel(0, 0), &WHITE);
        assert_eq!(img.get_pixel(4, 3), &WHITE);
        assert_eq!(img.get_pixel(5, 3), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(4, 4), &Rgb([0, 0, 0]));

        PixelBounds::new(-10, 100, 5, 100).fill(&mut img, WHITE);
        assert_eq!(img.get_pixel(5, 5), &WHITE);
    }

    #[test]
    fn huge_margin_saturates() {
        let b = PixelBounds::new(1, 3, 1, 2).expanded(i32::MAX);
        assert_eq!(b, PixelBounds::new(i32::MIN + 2, i32::MAX, i32::MIN + 2, i32::MAX));

        let mut img = RgbImage::new(4, 4);
        b.fill(&mut img, WHITE);
        assert!(img.pixels().all(|p| *p == WHITE));
    }
}
