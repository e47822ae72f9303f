//! Command handlers.
//!
//! - [`SavePicture`]: write each region to a directory.
//! - [`LogRegion`]: log each region.
//! - [`OcrEvaluate`]: recognize handwritten math with a [`MarkupRecognizer`]
//!   and evaluate it with a [`ComputeKernel`] such as [`WolframScript`].
//! - [`BackgroundHandler`]: run any handler on a worker thread.

mod background;
mod evaluate;
mod kernel;
mod log_region;
mod recognize;
mod save_picture;

pub use background::BackgroundHandler;
pub use evaluate::{Evaluation, OcrEvaluate};
pub use kernel::{tex_to_expression, ComputeKernel, KernelError, WolframScript};
pub use log_region::LogRegion;
pub use recognize::{MarkupRecognizer, Recognition, RecognitionError, RecognitionPolicy};
pub use save_picture::SavePicture;
