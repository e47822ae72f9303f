//! The seam to an external fiducial detector.

use crate::MarkerSet;
use image::RgbImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Raw output of a detector run on one image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetections {
    pub markers: MarkerSet,
    /// Contours the detector considered and rejected. Diagnostic only.
    #[serde(default)]
    pub rejected: Vec<Vec<Point2<f32>>>,
}

impl From<MarkerSet> for MarkerDetections {
    fn from(markers: MarkerSet) -> Self {
        Self {
            markers,
            rejected: Vec::new(),
        }
    }
}

/// A fiducial marker detector.
///
/// Finding no markers is not an error: implementations return an empty
/// [`MarkerSet`] and callers decide whether the frame is usable.
pub trait MarkerDetector {
    fn detect(&self, image: &RgbImage) -> MarkerDetections;
}

impl<T: MarkerDetector + ?Sized> MarkerDetector for &T {
    fn detect(&self, image: &RgbImage) -> MarkerDetections {
        (**self).detect(image)
    }
}

impl<T: MarkerDetector + ?Sized> MarkerDetector for Box<T> {
    fn detect(&self, image: &RgbImage) -> MarkerDetections {
        (**self).detect(image)
    }
}

/// Detector that reports the same detections for every image.
///
/// Useful when marker positions come from elsewhere, e.g. a JSON sidecar
/// recorded for a fixed camera.
#[derive(Clone, Debug, Default)]
pub struct FixedMarkers {
    detections: MarkerDetections,
}

impl FixedMarkers {
    pub fn new(detections: impl Into<MarkerDetections>) -> Self {
        Self {
            detections: detections.into(),
        }
    }
}

impl MarkerDetector for FixedMarkers {
    fn detect(&self, _image: &RgbImage) -> MarkerDetections {
        self.detections.clone()
    }
}

/// Marker localizer: runs a detector and keeps only the accepted markers.
pub struct MarkerLocalizer<D> {
    detector: D,
}

impl<D: MarkerDetector> MarkerLocalizer<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Markers visible in `image`; possibly empty.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    pub fn locate(&self, image: &RgbImage) -> MarkerSet {
        let MarkerDetections { markers, rejected } = self.detector.detect(image);
        log::trace!(
            "marker detector: {} accepted, {} rejected candidates",
            markers.len(),
            rejected.len()
        );
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Marker;

    struct CountingDetector;

    impl MarkerDetector for CountingDetector {
        fn detect(&self, image: &RgbImage) -> MarkerDetections {
            let n = image.width() / 10;
            MarkerDetections {
                markers: (0..n)
                    .map(|i| Marker::square(i, i as f32 * 10.0, 0.0, 5.0))
                    .collect(),
                rejected: vec![vec![Point2::new(0.0, 0.0)]],
            }
        }
    }

    #[test]
    fn localizer_drops_rejected_candidates() {
        let localizer = MarkerLocalizer::new(CountingDetector);
        let set = localizer.locate(&RgbImage::new(40, 10));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn empty_detection_is_not_an_error() {
        let localizer = MarkerLocalizer::new(FixedMarkers::default());
        assert!(localizer.locate(&RgbImage::new(4, 4)).is_empty());
    }

    #[test]
    fn boxed_and_borrowed_detectors_delegate() {
        let fixed = FixedMarkers::new(MarkerSet::new(vec![Marker::square(9, 0.0, 0.0, 1.0)]));
        let boxed: Box<dyn MarkerDetector> = Box::new(fixed.clone());
        let img = RgbImage::new(1, 1);
        assert_eq!(boxed.detect(&img).markers.len(), 1);
        assert_eq!((&fixed).detect(&img).markers.markers[0].id, 9);
    }
}
