//! Approximate head-on view of the board from its corner markers.
//!
//! Each marker is a printed square. For every marker we solve the
//! perspective transform that maps its observed quadrilateral onto an
//! axis-aligned square anchored at its top-left corner, with side equal to
//! the column offset between its first two corners. The per-marker transforms are averaged
//! coefficient-by-coefficient and the full frame is warped through the
//! result.
//!
//! The averaged matrix is not a geometric blend of the per-marker
//! transforms, and the result is only approximately rectified: some residual
//! skew remains when the markers disagree.

use archimedes_core::{homography_from_4pt, warp_perspective_rgb, Homography};
use archimedes_markers::{Marker, MarkerSet};
use image::{Rgb, RgbImage};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("need at least {required} markers to normalize, found {found}")]
    TooFewMarkers { found: usize, required: usize },
    #[error("marker {id} has a degenerate quadrilateral")]
    DegenerateMarker { id: u32 },
    #[error("averaged perspective transform is not invertible")]
    NonInvertible,
}

/// Size of the canvas the normalized image is drawn on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanvasPolicy {
    /// Same size as the input frame. Content pushed outside is clipped.
    #[default]
    Input,
    /// Grow (or shrink) the canvas to the bounding box of the warped input
    /// frame, shifted so it starts at the origin. Each side is capped at
    /// `max_side` pixels.
    FitWarped { max_side: u32 },
}

/// Parameters of the perspective normalizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeParams {
    /// Minimal number of markers required to attempt normalization.
    pub min_markers: usize,
    pub canvas: CanvasPolicy,
    /// Color of canvas pixels that map outside the input frame.
    pub border_rgb: [u8; 3],
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            min_markers: 2,
            canvas: CanvasPolicy::Input,
            border_rgb: [0, 0, 0],
        }
    }
}

/// A warped frame and the transform that produced it.
#[derive(Clone, Debug)]
pub struct NormalizedBoard {
    pub image: RgbImage,
    /// Camera pixel -> normalized pixel (canvas offset included).
    pub transform: Homography,
}

/// Transform that straightens one marker into an axis-aligned square.
///
/// The square keeps the marker's top-left corner and uses the x offset
/// from corner 0 to corner 1 as its side, so a tilted marker shrinks by the
/// cosine of its tilt. This assumes the detector reports corners 0 and 1 as
/// the adjacent top-left/top-right pair; a detector with a rotated winding
/// silently yields a wrong side length.
pub fn marker_straightening_transform(marker: &Marker) -> Option<Homography> {
    let side = marker.top_edge_width();
    if !side.is_finite() || side <= f32::EPSILON {
        return None;
    }
    let tl = marker.corners[0];
    let target = [
        tl,
        Point2::new(tl.x + side, tl.y),
        Point2::new(tl.x + side, tl.y + side),
        Point2::new(tl.x, tl.y + side),
    ];
    homography_from_4pt(&marker.corners, &target)
}

/// Element-wise average of every marker's straightening transform.
pub fn averaged_transform(markers: &MarkerSet) -> Result<Homography, NormalizeError> {
    let transforms = markers
        .iter()
        .map(|m| {
            marker_straightening_transform(m).ok_or(NormalizeError::DegenerateMarker { id: m.id })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Homography::mean(&transforms).ok_or(NormalizeError::TooFewMarkers {
        found: 0,
        required: 1,
    })
}

/// Warps frames into an approximately head-on view.
#[derive(Clone, Debug, Default)]
pub struct PerspectiveNormalizer {
    params: NormalizeParams,
}

impl PerspectiveNormalizer {
    pub fn new(params: NormalizeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &NormalizeParams {
        &self.params
    }

    /// Whether `markers` is large enough to attempt normalization.
    #[inline]
    pub fn accepts(&self, markers: &MarkerSet) -> bool {
        markers.len() >= self.required_markers()
    }

    fn required_markers(&self) -> usize {
        self.params.min_markers.max(1)
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image, markers),
            fields(width = image.width(), height = image.height(), markers = markers.len())
        )
    )]
    pub fn normalize(
        &self,
        image: &RgbImage,
        markers: &MarkerSet,
    ) -> Result<NormalizedBoard, NormalizeError> {
        if !self.accepts(markers) {
            return Err(NormalizeError::TooFewMarkers {
                found: markers.len(),
                required: self.required_markers(),
            });
        }

        let h = averaged_transform(markers)?;
        let (transform, out_w, out_h) = match self.params.canvas {
            CanvasPolicy::Input => (h, image.width(), image.height()),
            CanvasPolicy::FitWarped { max_side } => fit_canvas(&h, image, max_side)
                .unwrap_or((h, image.width(), image.height())),
        };

        log::debug!(
            "normalizing {}x{} frame from {} markers onto {}x{} canvas",
            image.width(),
            image.height(),
            markers.len(),
            out_w,
            out_h
        );

        let image = warp_perspective_rgb(
            image,
            &transform,
            out_w,
            out_h,
            Rgb(self.params.border_rgb),
        )
        .ok_or(NormalizeError::NonInvertible)?;

        Ok(NormalizedBoard { image, transform })
    }
}

/// Offset transform and canvas size covering the warped frame.
fn fit_canvas(h: &Homography, image: &RgbImage, max_side: u32) -> Option<(Homography, u32, u32)> {
    let (w, hgt) = (image.width() as f32, image.height() as f32);
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, hgt),
        Point2::new(0.0, hgt),
    ]
    .map(|p| h.apply(p));
    if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return None;
    }

    let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

    let cap = max_side.max(1) as f32;
    let out_w = (max_x - min_x).ceil().clamp(1.0, cap) as u32;
    let out_h = (max_y - min_y).ceil().clamp(1.0, cap) as u32;

    let shift = Homography::translation(-(min_x as f64), -(min_y as f64));
    Some((shift.compose(h), out_w, out_h))
}
