use archimedes_commands::{CommandHandler, HandlerError};
use chrono::Utc;
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Saves every command region as a PNG in `directory`.
///
/// Files are named `<UTC %Y%m%d_%H%M%S>_<n>.png`; `n` counts the regions
/// saved by this handler so that two regions in the same second do not
/// collide.
#[derive(Debug)]
pub struct SavePicture {
    directory: PathBuf,
    saved: u64,
    last_path: Option<PathBuf>,
}

impl SavePicture {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            saved: 0,
            last_path: None,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of regions written so far.
    pub fn saved(&self) -> u64 {
        self.saved
    }

    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }

    fn next_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        self.directory.join(format!("{stamp}_{}.png", self.saved))
    }
}

impl CommandHandler for SavePicture {
    fn handle(&mut self, region: &RgbImage) -> Result<(), HandlerError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.next_path();
        region.save(&path)?;
        log::info!(
            "saved {}x{} region to {}",
            region.width(),
            region.height(),
            path.display()
        );
        self.saved += 1;
        self.last_path = Some(path);
        Ok(())
    }
}
