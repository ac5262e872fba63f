use crate::error::Result;
use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the external tools live and how they are run.
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "exiftool": "/opt/exiftool/exiftool", "timeout_secs": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ExifTool executable.
    pub exiftool: PathBuf,
    /// ImageMagick `identify` executable.
    pub imagemagick: PathBuf,
    /// GraphicsMagick `gm` executable; `identify` is passed as its first argument.
    pub graphicsmagick: PathBuf,
    /// Upper bound for a single tool invocation.
    pub timeout_secs: u64,
    /// Let ExifTool keep its `<file>_original` backup when writing.
    pub keep_backup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exiftool: PathBuf::from("exiftool"),
            imagemagick: PathBuf::from("identify"),
            graphicsmagick: PathBuf::from("gm"),
            timeout_secs: 60,
            keep_backup: false,
        }
    }
}

impl Config {
    /// Reads a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn executable(&self, tool: Tool) -> &Path {
        match tool {
            Tool::ImageMagick => &self.imagemagick,
            Tool::GraphicsMagick => &self.graphicsmagick,
            Tool::ExifTool => &self.exiftool,
        }
    }

    /// Arguments that go before any per-call argument.
    pub(crate) fn leading_args(&self, tool: Tool) -> &'static [&'static str] {
        match tool {
            Tool::GraphicsMagick => &["identify"],
            Tool::ImageMagick | Tool::ExifTool => &[],
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
