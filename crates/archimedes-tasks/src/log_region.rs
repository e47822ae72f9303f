use archimedes_commands::{CommandHandler, HandlerError};
use image::RgbImage;

/// Handler without side effects besides a log line per region.
#[derive(Clone, Debug)]
pub struct LogRegion {
    label: String,
    seen: u64,
}

impl LogRegion {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            seen: 0,
        }
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }
}

impl CommandHandler for LogRegion {
    fn handle(&mut self, region: &RgbImage) -> Result<(), HandlerError> {
        self.seen += 1;
        log::info!(
            "{}: region #{} ({}x{})",
            self.label,
            self.seen,
            region.width(),
            region.height()
        );
        Ok(())
    }
}
