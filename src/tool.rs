use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External program used to read or write metadata.
///
/// The tag vocabularies differ: ImageMagick and GraphicsMagick report
/// `identify -verbose` property names (`Geometry`, `Resolution`, `Channel depth:red`),
/// ExifTool reports its own tag names (`ImageWidth`, `XResolution`, `Keywords`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    ImageMagick,
    GraphicsMagick,
    ExifTool,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::ImageMagick, Tool::GraphicsMagick, Tool::ExifTool];

    /// Arguments that make the tool print its version and exit.
    pub(crate) fn version_args(self) -> &'static [&'static str] {
        match self {
            Tool::ImageMagick => &["-version"],
            Tool::GraphicsMagick => &["version"],
            Tool::ExifTool => &["-ver"],
        }
    }

    pub fn is_magick(self) -> bool {
        matches!(self, Tool::ImageMagick | Tool::GraphicsMagick)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::ImageMagick => "ImageMagick",
            Tool::GraphicsMagick => "GraphicsMagick",
            Tool::ExifTool => "ExifTool",
        };
        f.write_str(name)
    }
}

impl FromStr for Tool {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imagemagick" => Ok(Tool::ImageMagick),
            "graphicsmagick" => Ok(Tool::GraphicsMagick),
            "exiftool" => Ok(Tool::ExifTool),
            _ => Err(MetadataError::InvalidInput(format!("unsupported tool: {s:?}"))),
        }
    }
}
