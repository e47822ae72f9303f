//! Fiducial marker sets for whiteboard region localization.
//!
//! This crate does **not** detect markers. It defines the data a detector
//! produces ([`MarkerSet`], [`MarkerDetections`]), the [`MarkerDetector`]
//! seam an external detector plugs into, and a [`MarkerLocalizer`] that the
//! region pipeline consumes.

mod detector;
mod io;
mod marker;

pub use detector::{FixedMarkers, MarkerDetections, MarkerDetector, MarkerLocalizer};
pub use io::MarkersIoError;
pub use marker::{Marker, MarkerSet};
