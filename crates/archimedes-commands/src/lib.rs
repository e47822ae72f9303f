//! Colored command boxes on a normalized whiteboard frame.
//!
//! A command is a pen color plus an action. Per frame, [`dispatch_frame`]
//! masks out the boxes that already fired and are still blocked, segments
//! the frame with the command's [`ColorBand`], extracts four-cornered
//! outlines, runs the [`CommandHandler`] on each new box and blocks it.
//!
//! Hue, saturation and value use the OpenCV 8-bit scale (hue in `[0, 180)`).

mod blocked;
mod command;
mod dispatch;
mod handler;
mod polygon;
mod rectangles;
mod segment;

pub use blocked::{BlockParams, BlockedRegion, BlockedRegions};
pub use command::{detect_command_boxes, CommandBox, CommandParams};
pub use dispatch::{dispatch_frame, Command, FrameReport, HandlerFailure};
pub use handler::{CommandHandler, HandlerError};
pub use polygon::approximate_closed_polygon;
pub use rectangles::{clean_mask, find_rectangular_boxes, sigma_for_kernel, BoxDetectParams};
pub use segment::{any_in_band, filter_to_color, BandError, ColorBand, MASK_ON};

pub use imageproc::point::Point;
