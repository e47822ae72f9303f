use crate::{crop_to_markers, CropError, NormalizeError, NormalizeParams, PerspectiveNormalizer};
use archimedes_core::{Homography, PixelBounds};
use archimedes_markers::{MarkerDetector, MarkerLocalizer, MarkerSet};
use image::RgbImage;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Where the markers of the normalized frame come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedetectPolicy {
    /// Run the detector again on the normalized frame.
    #[default]
    Redetect,
    /// Map the camera-frame markers through the applied transform.
    ProjectOriginal,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionParams {
    pub normalize: NormalizeParams,
    pub redetect: RedetectPolicy,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Crop(#[from] CropError),
}

/// The cropped, head-on view of the marked board.
#[derive(Clone, Debug)]
pub struct BoardRegion {
    pub image: RgbImage,
    /// Crop rectangle in normalized-frame coordinates.
    pub bounds: PixelBounds,
    /// Camera pixel -> normalized pixel.
    pub transform: Homography,
    /// Markers in normalized-frame coordinates.
    pub markers: MarkerSet,
}

/// Locate, normalize and crop the board region of a camera frame.
pub struct BoardRegionExtractor<D> {
    localizer: MarkerLocalizer<D>,
    normalizer: PerspectiveNormalizer,
    redetect: RedetectPolicy,
}

impl<D: MarkerDetector> BoardRegionExtractor<D> {
    pub fn new(detector: D, params: RegionParams) -> Self {
        Self {
            localizer: MarkerLocalizer::new(detector),
            normalizer: PerspectiveNormalizer::new(params.normalize),
            redetect: params.redetect,
        }
    }

    pub fn normalizer(&self) -> &PerspectiveNormalizer {
        &self.normalizer
    }

    /// Markers of the camera frame.
    pub fn locate(&self, image: &RgbImage) -> MarkerSet {
        self.localizer.locate(image)
    }

    pub fn extract(&self, image: &RgbImage) -> Result<BoardRegion, RegionError> {
        let markers = self.locate(image);
        self.extract_with_markers(image, &markers)
    }

    /// Same as [`Self::extract`] with the camera-frame markers already known.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image, markers), fields(markers = markers.len()))
    )]
    pub fn extract_with_markers(
        &self,
        image: &RgbImage,
        markers: &MarkerSet,
    ) -> Result<BoardRegion, RegionError> {
        // 1) head-on view
        let normalized = self.normalizer.normalize(image, markers)?;

        // 2) markers in the normalized frame
        let markers = match self.redetect {
            RedetectPolicy::Redetect => self.localizer.locate(&normalized.image),
            RedetectPolicy::ProjectOriginal => markers.transformed(&normalized.transform),
        };

        // 3) erase and crop
        let cropped = crop_to_markers(&normalized.image, &markers)?;

        Ok(BoardRegion {
            image: cropped.image,
            bounds: cropped.bounds,
            transform: normalized.transform,
            markers,
        })
    }
}
