//! Per-frame command dispatch.

use crate::blocked::{BlockedRegion, BlockedRegions};
use crate::command::{detect_command_boxes, CommandBox, CommandParams};
use crate::handler::{CommandHandler, HandlerError};
use crate::segment::BandError;
use archimedes_core::PixelBounds;
use image::RgbImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A handler error together with the box it was raised for.
#[derive(Debug)]
pub struct HandlerFailure {
    pub bounds: PixelBounds,
    pub error: HandlerError,
}

/// What happened to one command on one frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Blocked regions before this frame.
    pub blocked_before: usize,
    /// Regions released after masking this frame.
    pub released: usize,
    /// Boxes found in the masked frame.
    pub detected: usize,
    /// Boxes whose handler succeeded.
    pub dispatched: usize,
    pub failures: Vec<HandlerFailure>,
}

/// Run one frame through a command.
///
/// 1. every blocked region is updated against `frame` and masked out;
/// 2. regions that became clear are dropped (they still masked this frame);
/// 3. boxes are detected in the masked frame;
/// 4. each box is cropped from the masked frame and handed to `handler`,
///    then blocked.
///
/// A failing handler does not stop the remaining boxes; its box is blocked
/// like any other.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(blocked = blocked.len()))
)]
pub fn dispatch_frame<H: CommandHandler + ?Sized>(
    frame: &RgbImage,
    params: &CommandParams,
    blocked: &mut BlockedRegions,
    handler: &mut H,
) -> FrameReport {
    let mut report = FrameReport {
        blocked_before: blocked.len(),
        ..FrameReport::default()
    };

    let masked = blocked.update_and_mask(frame);
    report.released = blocked.release_clear();

    let boxes = detect_command_boxes(&masked, &params.band, &params.boxes);
    report.detected = boxes.len();

    for CommandBox { corners, bounds } in boxes {
        let outcome = match bounds.crop(&masked) {
            Some(region) => {
                log::debug!(
                    "dispatching box {:?} ({}x{})",
                    bounds,
                    region.width(),
                    region.height()
                );
                handler.handle(&region)
            }
            None => Err(HandlerError::EmptyRegion),
        };
        match outcome {
            Ok(()) => report.dispatched += 1,
            Err(error) => {
                log::warn!("command handler failed on box {:?}: {}", bounds, error);
                report.failures.push(HandlerFailure { bounds, error });
            }
        }
        blocked.push(BlockedRegion::new(corners, params.band, params.blocking));
    }

    report
}

/// A configured command: detection parameters, its handler and the regions
/// it currently blocks.
pub struct Command {
    name: String,
    params: CommandParams,
    handler: Box<dyn CommandHandler>,
    blocked: BlockedRegions,
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        params: CommandParams,
        handler: impl CommandHandler + 'static,
    ) -> Result<Self, BandError> {
        Self::from_boxed(name, params, Box::new(handler))
    }

    pub fn from_boxed(
        name: impl Into<String>,
        params: CommandParams,
        handler: Box<dyn CommandHandler>,
    ) -> Result<Self, BandError> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            params,
            handler,
            blocked: BlockedRegions::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &CommandParams {
        &self.params
    }

    pub fn blocked(&self) -> &BlockedRegions {
        &self.blocked
    }

    /// Forget every blocked region.
    pub fn reset(&mut self) {
        self.blocked.clear();
    }

    pub fn process(&mut self, frame: &RgbImage) -> FrameReport {
        let report = dispatch_frame(frame, &self.params, &mut self.blocked, &mut *self.handler);
        log::debug!(
            "command '{}': {} detected, {} dispatched, {} failed, {} blocked",
            self.name,
            report.detected,
            report.dispatched,
            report.failures.len(),
            self.blocked.len()
        );
        report
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("blocked", &self.blocked.len())
            .finish_non_exhaustive()
    }
}
