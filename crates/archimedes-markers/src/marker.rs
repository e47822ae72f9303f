//! Marker geometry as reported by a fiducial detector.

use archimedes_core::{Homography, PixelBounds};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One detected fiducial marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: u32,
    /// Corners in image coordinates, in detector winding order
    /// (top-left, top-right, bottom-right, bottom-left).
    ///
    /// Nothing here verifies the winding: consumers that rely on corners 0
    /// and 1 forming the top edge depend on the detector honouring it.
    pub corners: [Point2<f32>; 4],
}

impl Marker {
    pub fn new(id: u32, corners: [Point2<f32>; 4]) -> Self {
        Self { id, corners }
    }

    /// Axis-aligned square marker with its top-left corner at `(x, y)`.
    pub fn square(id: u32, x: f32, y: f32, side: f32) -> Self {
        Self::new(
            id,
            [
                Point2::new(x, y),
                Point2::new(x + side, y),
                Point2::new(x + side, y + side),
                Point2::new(x, y + side),
            ],
        )
    }

    /// Column offset from corner 0 to corner 1.
    ///
    /// This is the horizontal extent of the top edge, not its length: a
    /// tilted marker measures shorter than its printed side.
    #[inline]
    pub fn top_edge_width(&self) -> f32 {
        self.corners[1].x - self.corners[0].x
    }

    #[inline]
    pub fn bounds(&self) -> PixelBounds {
        PixelBounds::from_quad(&self.corners)
    }

    /// Map every corner through `h`.
    pub fn transformed(&self, h: &Homography) -> Self {
        Self {
            id: self.id,
            corners: self.corners.map(|p| h.apply(p)),
        }
    }
}

/// All markers detected in one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerSet {
    pub markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new(markers: Vec<Marker>) -> Self {
        Self { markers }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    /// Every corner of every marker.
    pub fn corners(&self) -> impl Iterator<Item = &Point2<f32>> + '_ {
        self.markers.iter().flat_map(|m| m.corners.iter())
    }

    /// Union bounds of all marker corners, `None` when the set is empty.
    pub fn bounds(&self) -> Option<PixelBounds> {
        PixelBounds::from_points(self.corners())
    }

    pub fn transformed(&self, h: &Homography) -> Self {
        Self::new(self.markers.iter().map(|m| m.transformed(h)).collect())
    }

    pub fn find(&self, id: u32) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }
}

impl<'a> IntoIterator for &'a MarkerSet {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.markers.iter()
    }
}

impl FromIterator<Marker> for MarkerSet {
    fn from_iter<T: IntoIterator<Item = Marker>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
