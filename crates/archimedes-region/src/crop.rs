//! Cropping the normalized frame to the marked region.
//!
//! Assumes a single, roughly axis-aligned region with one marker at each of
//! its corners. Other layouts produce a meaningless crop rather than an
//! error.

use archimedes_core::{PixelBounds, WHITE};
use archimedes_markers::MarkerSet;
use image::RgbImage;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropError {
    #[error("no markers to crop to")]
    NoMarkers,
    #[error("marker bounds {0:?} do not overlap the image")]
    EmptyRegion(PixelBounds),
}

/// The board region cut out of a normalized frame.
#[derive(Clone, Debug)]
pub struct CroppedRegion {
    pub image: RgbImage,
    /// Union of all marker corners, in the coordinates of the uncropped
    /// image.
    pub bounds: PixelBounds,
}

/// Paint every marker's bounding box white.
pub fn erase_markers(image: &mut RgbImage, markers: &MarkerSet) {
    for marker in markers {
        marker.bounds().fill(image, WHITE);
    }
}

/// Erase the markers and crop to their union bounding box.
pub fn crop_to_markers(image: &RgbImage, markers: &MarkerSet) -> Result<CroppedRegion, CropError> {
    let bounds = markers.bounds().ok_or(CropError::NoMarkers)?;

    let mut erased = image.clone();
    erase_markers(&mut erased, markers);

    let cropped = bounds
        .crop(&erased)
        .ok_or(CropError::EmptyRegion(bounds))?;
    log::debug!(
        "cropped board region {:?} -> {}x{}",
        bounds,
        cropped.width(),
        cropped.height()
    );

    Ok(CroppedRegion {
        image: cropped,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use archimedes_markers::Marker;
    use image::Rgb;

    const INK: Rgb<u8> = Rgb([10, 10, 10]);

    fn board_with_markers() -> (RgbImage, MarkerSet) {
        let markers = MarkerSet::new(vec![
            Marker::square(0, 10.0, 10.0, 8.0),
            Marker::square(1, 50.0, 10.0, 8.0),
            Marker::square(2, 50.0, 40.0, 8.0),
            Marker::square(3, 10.0, 40.0, 8.0),
        ]);
        let mut img = RgbImage::from_pixel(80, 60, Rgb([200, 200, 200]));
        for m in &markers {
            m.bounds().fill(&mut img, INK);
        }
        (img, markers)
    }

    #[test]
    fn crop_covers_union_of_markers() {
        let (img, markers) = board_with_markers();
        let region = crop_to_markers(&img, &markers).expect("crop");
        assert_eq!(region.bounds, PixelBounds::new(10, 58, 10, 48));
        assert_eq!(region.image.dimensions(), (48, 38));
    }

    #[test]
    fn markers_are_erased_to_white() {
        let (img, markers) = board_with_markers();
        let region = crop_to_markers(&img, &markers).expect("crop");
        assert!(region.image.pixels().all(|p| *p != INK));
        assert_eq!(region.image.get_pixel(0, 0), &WHITE);
        assert_eq!(region.image.get_pixel(20, 15), &Rgb([200, 200, 200]));
    }

    #[test]
    fn empty_marker_set_is_rejected() {
        let img = RgbImage::new(4, 4);
        assert_eq!(
            crop_to_markers(&img, &MarkerSet::default()).unwrap_err(),
            CropError::NoMarkers
        );
    }

    #[test]
    fn markers_outside_image_give_empty_region() {
        let img = RgbImage::new(20, 20);
        let markers = MarkerSet::new(vec![Marker::square(0, 100.0, 100.0, 5.0)]);
        assert!(matches!(
            crop_to_markers(&img, &markers),
            Err(CropError::EmptyRegion(_))
        ));
    }
}
