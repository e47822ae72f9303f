//! Debouncing of dispatched command boxes.
//!
//! Once a box has been dispatched, the area it occupies stays blocked until
//! a cooldown has elapsed *and* its corners have been free of the command
//! color for a number of consecutive frames. The two countdowns run in
//! parallel; any colored corner restarts the clear streak.

use crate::segment::{any_in_band, ColorBand};
use archimedes_core::{PixelBounds, WHITE};
use image::RgbImage;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Tuning of a blocked region's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockParams {
    /// Frames a region stays blocked regardless of its content.
    pub cooldown_frames: u32,
    /// Consecutive clear-corner frames required before release.
    pub clear_frames: u32,
    /// Half-size of the corner patches, and the margin painted around the
    /// region when masking.
    pub clear_pixels: u32,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            cooldown_frames: 30,
            clear_frames: 5,
            clear_pixels: 10,
        }
    }
}

/// One dispatched box that must not fire again yet.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockedRegion {
    corners: [Point<i32>; 4],
    bounds: PixelBounds,
    band: ColorBand,
    params: BlockParams,
    cooldown_remaining: u32,
    clear_remaining: u32,
}

impl BlockedRegion {
    pub fn new(corners: [Point<i32>; 4], band: ColorBand, params: BlockParams) -> Self {
        let bounds = PixelBounds::from_pixels(corners.iter().map(|p| (p.x, p.y)))
            .unwrap_or(PixelBounds::new(0, 0, 0, 0));
        Self {
            corners,
            bounds,
            band,
            params,
            cooldown_remaining: params.cooldown_frames,
            clear_remaining: params.clear_frames,
        }
    }

    #[inline]
    pub fn corners(&self) -> &[Point<i32>; 4] {
        &self.corners
    }

    #[inline]
    pub fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    #[inline]
    pub fn band(&self) -> &ColorBand {
        &self.band
    }

    #[inline]
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    #[inline]
    pub fn clear_remaining(&self) -> u32 {
        self.clear_remaining
    }

    /// True when no corner patch of `image` contains a pixel of the band.
    pub fn corners_clear(&self, image: &RgbImage) -> bool {
        let r = self.margin();
        !self
            .corners
            .iter()
            .any(|c| any_in_band(image, &self.band, c.x, c.y, r))
    }

    /// Advance both countdowns by one frame.
    pub fn update(&mut self, image: &RgbImage) {
        if self.corners_clear(image) {
            self.clear_remaining = self.clear_remaining.saturating_sub(1);
        } else {
            self.clear_remaining = self.params.clear_frames;
        }
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
    }

    #[inline]
    pub fn is_clear(&self) -> bool {
        self.cooldown_remaining == 0 && self.clear_remaining == 0
    }

    /// Area hidden by [`Self::mask_region`]: the bounds grown by
    /// `clear_pixels`, max edges included.
    pub fn masked_bounds(&self) -> PixelBounds {
        self.bounds.expanded(self.margin())
    }

    fn margin(&self) -> i32 {
        i32::try_from(self.params.clear_pixels).unwrap_or(i32::MAX)
    }

    /// Copy of `image` with the region painted white.
    pub fn mask_region(&self, image: &RgbImage) -> RgbImage {
        let mut out = image.clone();
        self.mask_in_place(&mut out);
        out
    }

    pub fn mask_in_place(&self, image: &mut RgbImage) {
        self.masked_bounds().fill(image, WHITE);
    }
}

/// The blocked regions owned by one command.
#[derive(Clone, Debug, Default)]
pub struct BlockedRegions {
    regions: Vec<BlockedRegion>,
}

impl BlockedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockedRegion> {
        self.regions.iter()
    }

    pub fn push(&mut self, region: BlockedRegion) {
        self.regions.push(region);
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Update every region against `frame` and return a copy of the frame
    /// with all of them masked out.
    ///
    /// Regions that became clear during this update are still masked; use
    /// [`Self::release_clear`] afterwards to drop them.
    pub fn update_and_mask(&mut self, frame: &RgbImage) -> RgbImage {
        let mut masked = frame.clone();
        for region in &mut self.regions {
            region.update(frame);
            region.mask_in_place(&mut masked);
        }
        masked
    }

    /// Drop every clear region; returns how many were dropped.
    pub fn release_clear(&mut self) -> usize {
        let before = self.regions.len();
        self.regions.retain(|r| !r.is_clear());
        let released = before - self.regions.len();
        if released > 0 {
            log::debug!("released {released} blocked regions");
        }
        released
    }
}

impl<'a> IntoIterator for &'a BlockedRegions {
    type Item = &'a BlockedRegion;
    type IntoIter = std::slice::Iter<'a, BlockedRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::filter_to_color;
    use image::Rgb;

    const BLUE: Rgb<u8> = Rgb([20, 40, 230]);

    fn quad(x0: i32, y0: i32, x1: i32, y1: i32) -> [Point<i32>; 4] {
        [
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    fn region(cooldown: u32, clear: u32) -> BlockedRegion {
        BlockedRegion::new(
            quad(20, 20, 60, 50),
            ColorBand::new(120),
            BlockParams {
                cooldown_frames: cooldown,
                clear_frames: clear,
                clear_pixels: 4,
            },
        )
    }

    fn blank() -> RgbImage {
        RgbImage::from_pixel(100, 80, Rgb([255, 255, 255]))
    }

    fn with_colored_corner() -> RgbImage {
        let mut img = blank();
        img.put_pixel(62, 48, BLUE);
        img
    }

    #[test]
    fn new_region_is_not_clear_unless_both_counts_are_zero() {
        assert!(!region(3, 3).is_clear());
        assert!(!region(0, 3).is_clear());
        assert!(!region(3, 0).is_clear());
        assert!(region(0, 0).is_clear());
    }

    #[test]
    fn clear_after_max_of_both_countdowns() {
        for (cooldown, clear) in [(3, 3), (1, 4), (6, 2), (0, 5), (5, 0)] {
            let mut r = region(cooldown, clear);
            let n = cooldown.max(clear);
            for i in 1..=n {
                r.update(&blank());
                assert_eq!(r.is_clear(), i == n, "cooldown {cooldown}, clear {clear}, update {i}");
            }
        }
    }

    #[test]
    fn three_by_three_scenario() {
        let mut r = region(3, 3);
        r.update(&blank());
        r.update(&blank());
        assert!(!r.is_clear());
        r.update(&blank());
        assert!(r.is_clear());
    }

    #[test]
    fn colored_corner_restarts_the_clear_streak() {
        let mut r = region(3, 3);
        let frames = [blank(), with_colored_corner(), blank(), blank(), blank()];
        for (i, frame) in frames.iter().enumerate() {
            r.update(frame);
            let update = i + 1;
            assert_eq!(r.is_clear(), update == 5, "update {update}");
        }
        assert_eq!(r.cooldown_remaining(), 0);
    }

    #[test]
    fn colored_pixel_outside_corner_patches_is_ignored() {
        let mut img = blank();
        // middle of the top edge, far from every corner
        img.put_pixel(40, 20, BLUE);
        let r = region(1, 1);
        assert!(r.corners_clear(&img));
        assert!(!r.corners_clear(&with_colored_corner()));
    }

    #[test]
    fn mask_then_filter_leaves_no_color() {
        let r = region(3, 3);
        let mut img = blank();
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) * 13 % 256) as u8]);
        }
        let masked = r.mask_region(&img);
        let mask = filter_to_color(&masked, r.band());
        let b = r.masked_bounds();
        assert_eq!(b, PixelBounds::new(16, 64, 16, 54));
        for y in b.y_min..=b.y_max {
            for x in b.x_min..=b.x_max {
                assert_eq!(mask.get_pixel(x as u32, y as u32)[0], 0, "({x}, {y})");
            }
        }
        assert_eq!(masked.get_pixel(0, 0), img.get_pixel(0, 0));
    }

    #[test]
    fn oversized_clear_margin_covers_the_whole_frame() {
        let mut r = BlockedRegion::new(
            quad(20, 20, 60, 50),
            ColorBand::new(120),
            BlockParams {
                cooldown_frames: 1,
                clear_frames: 1,
                clear_pixels: u32::MAX,
            },
        );
        let mut frame = blank();
        frame.put_pixel(0, 0, BLUE);

        r.update(&frame);
        assert_eq!(r.clear_remaining(), 1);
        let masked = r.mask_region(&frame);
        assert!(masked.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn collection_masks_before_releasing() {
        let mut regions = BlockedRegions::new();
        regions.push(region(1, 1));
        regions.push(region(2, 1));

        let mut frame = blank();
        frame.put_pixel(40, 30, BLUE);
        let masked = regions.update_and_mask(&frame);
        assert_eq!(masked.get_pixel(40, 30), &WHITE);
        assert_eq!(regions.release_clear(), 1);
        assert_eq!(regions.len(), 1);

        regions.update_and_mask(&frame);
        assert_eq!(regions.release_clear(), 1);
        assert!(regions.is_empty());
    }
}
