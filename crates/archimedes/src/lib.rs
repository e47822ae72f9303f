//! Whiteboard command detection.
//!
//! A camera watches a whiteboard framed by fiducial markers. Every frame is
//! straightened into a head-on view, cropped to the marked region, and then
//! searched for colored hand-drawn boxes. Each configured command owns one
//! pen color and one action; a new box of that color runs the action once
//! on the box contents, and the box stays blocked until it is erased.
//!
//! ## Quickstart
//!
//! ```no_run
//! use archimedes::commands::{ColorBand, Command, CommandParams};
//! use archimedes::markers::{FixedMarkers, MarkerDetections};
//! use archimedes::region::RegionParams;
//! use archimedes::tasks::SavePicture;
//! use archimedes::WhiteboardPipeline;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = image::open("frame.png")?.to_rgb8();
//! let markers = MarkerDetections::load_json("frame.markers.json")?;
//!
//! let save_blue = Command::new(
//!     "save-blue",
//!     CommandParams::new(ColorBand::new(120)),
//!     SavePicture::new("boxes"),
//! )?;
//! let mut pipeline = WhiteboardPipeline::new(FixedMarkers::new(markers), RegionParams::default())
//!     .with_command(save_blue);
//!
//! let outcome = pipeline.process_frame(&frame);
//! println!("dispatched {}", outcome.dispatched());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `archimedes::core`: homographies, warping, HSV, pixel bounds, logging.
//! - `archimedes::markers`: marker sets and the detector seam.
//! - `archimedes::region`: perspective normalization and cropping.
//! - `archimedes::commands`: segmentation, box extraction, debounce, dispatch.
//! - `archimedes::tasks`: ready-made command handlers.
//! - [`config`]: JSON configuration of a whole pipeline.

pub use archimedes_commands as commands;
pub use archimedes_core as core;
pub use archimedes_markers as markers;
pub use archimedes_region as region;
pub use archimedes_tasks as tasks;

pub mod config;
pub mod pipeline;

pub use config::{CommandConfig, ConfigError, TaskConfig, WhiteboardConfig};
pub use pipeline::{CommandReport, FrameOutcome, SkipReason, WhiteboardPipeline};
