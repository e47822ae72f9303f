//! JSON configuration of a whiteboard pipeline.
//!
//! ```json
//! {
//!   "region": { "normalize": { "min_markers": 2 }, "redetect": "redetect" },
//!   "commands": [
//!     {
//!       "name": "save-blue",
//!       "task": { "kind": "save_picture", "directory": "boxes" },
//!       "band": { "target_hue": 120 },
//!       "blocking": { "cooldown_frames": 30 }
//!     }
//!   ]
//! }
//! ```

use crate::commands::{BandError, Command, CommandHandler, CommandParams, HandlerError};
use crate::markers::MarkerDetector;
use crate::pipeline::WhiteboardPipeline;
use crate::region::RegionParams;
use crate::tasks::{BackgroundHandler, LogRegion, SavePicture};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("command '{name}': {source}")]
    Band {
        name: String,
        #[source]
        source: BandError,
    },
    #[error("command '{name}': {source}")]
    Handler {
        name: String,
        #[source]
        source: HandlerError,
    },
}

/// Action of a configured command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskConfig {
    SavePicture { directory: PathBuf },
    Log,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub name: String,
    pub task: TaskConfig,
    /// Run the task on a worker thread.
    #[serde(default)]
    pub background: bool,
    #[serde(flatten)]
    pub params: CommandParams,
}

impl CommandConfig {
    pub fn build(&self) -> Result<Command, ConfigError> {
        match &self.task {
            TaskConfig::SavePicture { directory } => self.with_handler(SavePicture::new(directory.clone())),
            TaskConfig::Log => self.with_handler(LogRegion::new(self.name.clone())),
        }
    }

    fn with_handler<H: CommandHandler + 'static>(&self, handler: H) -> Result<Command, ConfigError> {
        let command = if self.background {
            let bg = BackgroundHandler::spawn(self.name.clone(), handler).map_err(|source| {
                ConfigError::Handler {
                    name: self.name.clone(),
                    source,
                }
            })?;
            Command::new(self.name.clone(), self.params.clone(), bg)
        } else {
            Command::new(self.name.clone(), self.params.clone(), handler)
        };
        command.map_err(|source| ConfigError::Band {
            name: self.name.clone(),
            source,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteboardConfig {
    pub region: RegionParams,
    pub parallel_commands: bool,
    pub commands: Vec<CommandConfig>,
}

impl WhiteboardConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn build_commands(&self) -> Result<Vec<Command>, ConfigError> {
        self.commands.iter().map(CommandConfig::build).collect()
    }

    pub fn into_pipeline<D: MarkerDetector>(
        &self,
        detector: D,
    ) -> Result<WhiteboardPipeline<D>, ConfigError> {
        let mut pipeline = WhiteboardPipeline::new(detector, self.region.clone())
            .with_parallel_commands(self.parallel_commands);
        for command in self.build_commands()? {
            pipeline.push_command(command);
        }
        Ok(pipeline)
    }
}
