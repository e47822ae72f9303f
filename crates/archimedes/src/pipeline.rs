//! Frame-by-frame whiteboard processing.

use crate::commands::{Command, FrameReport};
use crate::markers::MarkerDetector;
use crate::region::{BoardRegionExtractor, CropError, NormalizeError, RegionError, RegionParams};
use image::RgbImage;
use std::thread;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Why a frame was not processed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("found {found} markers, need at least {required}")]
    TooFewMarkers { found: usize, required: usize },
    #[error(transparent)]
    Normalize(NormalizeError),
    #[error(transparent)]
    Crop(CropError),
}

impl From<RegionError> for SkipReason {
    fn from(e: RegionError) -> Self {
        match e {
            RegionError::Normalize(NormalizeError::TooFewMarkers { found, required }) => {
                SkipReason::TooFewMarkers { found, required }
            }
            RegionError::Normalize(e) => SkipReason::Normalize(e),
            RegionError::Crop(e) => SkipReason::Crop(e),
        }
    }
}

/// One command's share of a processed frame.
#[derive(Debug)]
pub struct CommandReport {
    pub name: String,
    pub report: FrameReport,
}

#[derive(Debug)]
pub enum FrameOutcome {
    Skipped { reason: SkipReason },
    Processed {
        /// Size of the cropped board the commands ran on.
        board_size: (u32, u32),
        reports: Vec<CommandReport>,
    },
}

impl FrameOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, FrameOutcome::Processed { .. })
    }

    /// Handler invocations that succeeded on this frame.
    pub fn dispatched(&self) -> usize {
        match self {
            FrameOutcome::Skipped { .. } => 0,
            FrameOutcome::Processed { reports, .. } => {
                reports.iter().map(|r| r.report.dispatched).sum()
            }
        }
    }
}

/// Camera frames in, command handler invocations out.
///
/// Frames must be fed in arrival order: every command keeps blocked-region
/// counters that advance once per processed frame.
pub struct WhiteboardPipeline<D> {
    extractor: BoardRegionExtractor<D>,
    commands: Vec<Command>,
    parallel_commands: bool,
}

impl<D: MarkerDetector> WhiteboardPipeline<D> {
    pub fn new(detector: D, params: RegionParams) -> Self {
        Self {
            extractor: BoardRegionExtractor::new(detector, params),
            commands: Vec::new(),
            parallel_commands: false,
        }
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn push_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Run the commands of a frame on scoped threads instead of one after
    /// the other.
    pub fn with_parallel_commands(mut self, parallel: bool) -> Self {
        self.parallel_commands = parallel;
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut [Command] {
        &mut self.commands
    }

    pub fn extractor(&self) -> &BoardRegionExtractor<D> {
        &self.extractor
    }

    /// Locate the board in a camera frame and run every command on it.
    ///
    /// Frames with too few markers, or whose markers do not yield a usable
    /// crop, are skipped and leave all command state untouched.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = image.width(), height = image.height()))
    )]
    pub fn process_frame(&mut self, image: &RgbImage) -> FrameOutcome {
        let markers = self.extractor.locate(image);
        if !self.extractor.normalizer().accepts(&markers) {
            let required = self.extractor.normalizer().params().min_markers.max(1);
            log::debug!(
                "skipping frame: {} markers, need {}",
                markers.len(),
                required
            );
            return FrameOutcome::Skipped {
                reason: SkipReason::TooFewMarkers {
                    found: markers.len(),
                    required,
                },
            };
        }

        let board = match self.extractor.extract_with_markers(image, &markers) {
            Ok(board) => board,
            Err(e) => {
                log::debug!("skipping frame: {e}");
                return FrameOutcome::Skipped { reason: e.into() };
            }
        };

        let reports = self.process_normalized(&board.image);
        FrameOutcome::Processed {
            board_size: board.image.dimensions(),
            reports,
        }
    }

    /// Run every command on an already normalized and cropped board.
    pub fn process_normalized(&mut self, board: &RgbImage) -> Vec<CommandReport> {
        if !self.parallel_commands || self.commands.len() < 2 {
            return self
                .commands
                .iter_mut()
                .map(|cmd| CommandReport {
                    name: cmd.name().to_owned(),
                    report: cmd.process(board),
                })
                .collect();
        }

        thread::scope(|s| {
            let handles: Vec<_> = self
                .commands
                .iter_mut()
                .map(|cmd| {
                    s.spawn(move || CommandReport {
                        name: cmd.name().to_owned(),
                        report: cmd.process(board),
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(report) => report,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}
