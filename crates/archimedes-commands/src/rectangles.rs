//! Quadrilateral extraction from a binary color mask.

use crate::polygon::approximate_closed_polygon;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{arc_length, contour_area};
use imageproc::morphology::{dilate, open};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Tuning of [`find_rectangular_boxes`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxDetectParams {
    /// Polygon approximation tolerance as a fraction of the contour
    /// perimeter.
    pub max_dist_fraction: f64,
    /// Minimal enclosed contour area, in pixels.
    pub min_area: f64,
    /// Gaussian kernel size; 0 disables blurring.
    pub blur_size: u32,
    /// Structuring element size of the open + dilate pass; 0 disables it.
    pub dilate_size: u32,
    /// Binarization level applied after blurring.
    pub threshold: u8,
}

impl Default for BoxDetectParams {
    fn default() -> Self {
        Self {
            max_dist_fraction: 0.05,
            min_area: 1000.0,
            blur_size: 21,
            dilate_size: 5,
            threshold: 60,
        }
    }
}

/// Gaussian sigma used for a `ksize`-wide kernel when none is given.
#[inline]
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn binarize(mask: &mut GrayImage, level: u8) {
    for Luma([v]) in mask.pixels_mut() {
        *v = if *v > level { 255 } else { 0 };
    }
}

/// Blur, binarize and close gaps in `mask`.
pub fn clean_mask(mask: &GrayImage, params: &BoxDetectParams) -> GrayImage {
    // 1) denoise
    let mut img = if params.blur_size > 0 {
        gaussian_blur_f32(mask, sigma_for_kernel(params.blur_size).max(0.1))
    } else {
        mask.clone()
    };

    // 2) strict 0/255
    binarize(&mut img, params.threshold);

    // 3) drop speckles, then bridge small gaps in the outline
    let radius = (params.dilate_size / 2).min(u8::MAX as u32) as u8;
    if params.dilate_size > 0 && radius > 0 {
        img = open(&img, Norm::LInf, radius);
        img = dilate(&img, Norm::LInf, radius);
    }
    img
}

/// Four-vertex outlines of the filled or outlined shapes in `mask`.
///
/// Only outer borders are considered. A border is kept when its enclosed
/// area reaches `min_area` and its Douglas–Peucker approximation, with a
/// tolerance of `max_dist_fraction` times its perimeter, has exactly four
/// vertices. The order of the returned boxes is unspecified.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, params), fields(width = mask.width(), height = mask.height()))
)]
pub fn find_rectangular_boxes(mask: &GrayImage, params: &BoxDetectParams) -> Vec<[Point<i32>; 4]> {
    let cleaned = clean_mask(mask, params);

    let contours = find_contours::<i32>(&cleaned);
    let mut boxes = Vec::new();
    for contour in contours
        .iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
    {
        let area = contour_area(&contour.points);
        if area < params.min_area {
            continue;
        }

        let epsilon = params.max_dist_fraction * arc_length(&contour.points, true);
        let poly = approximate_closed_polygon(&contour.points, epsilon);
        match <[Point<i32>; 4]>::try_from(poly) {
            Ok(quad) => boxes.push(quad),
            Err(poly) => log::trace!(
                "contour with area {area:.0} approximates to {} vertices",
                poly.len()
            ),
        }
    }

    log::debug!(
        "{} contours, {} rectangular boxes",
        contours.len(),
        boxes.len()
    );
    boxes
}
