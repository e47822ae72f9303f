//! Board region extraction: perspective normalization from corner markers,
//! marker erasure and cropping.
//!
//! ```no_run
//! use archimedes_markers::{FixedMarkers, MarkerDetections};
//! use archimedes_region::{BoardRegionExtractor, RegionParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = image::open("frame.png")?.to_rgb8();
//! let markers = MarkerDetections::load_json("frame.markers.json")?;
//! let extractor = BoardRegionExtractor::new(FixedMarkers::new(markers), RegionParams::default());
//! let board = extractor.extract(&frame)?;
//! println!("board {}x{}", board.image.width(), board.image.height());
//! # Ok(())
//! # }
//! ```

mod crop;
mod extract;
mod normalize;

pub use crop::{crop_to_markers, erase_markers, CropError, CroppedRegion};
pub use extract::{BoardRegion, BoardRegionExtractor, RedetectPolicy, RegionError, RegionParams};
pub use normalize::{
    averaged_transform, marker_straightening_transform, CanvasPolicy, NormalizeError,
    NormalizeParams, NormalizedBoard, PerspectiveNormalizer,
};
