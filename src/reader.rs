use crate::blob::{Blob, LocalFile};
use crate::config::Config;
use crate::error::Result;
use crate::identify;
use crate::metadata::MetadataMap;
use crate::process::ToolCommand;
use crate::resolution::Dpi;
use crate::tag_line::TagLine;
use crate::tool::Tool;
use std::path::{Path, PathBuf};

/// Reads the metadata of one file through an external tool.
///
/// Each call spawns the tool once and waits for it.
///
/// # Example
/// ```no_run
/// # use binmeta::{MetadataReader, MetadataError, Tool};
/// # fn main() -> Result<(), MetadataError> {
/// let reader = MetadataReader::new("data/a.png");
/// let tags = reader.read_tags(Tool::ExifTool, &["ImageWidth", "ImageHeight", "Keywords"])?;
/// println!("{} x {}", tags.get("ImageWidth").unwrap_or(""), tags.get("ImageHeight").unwrap_or(""));
/// // Tags the file does not have are present with an empty value.
/// assert!(tags.contains_key("Keywords"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MetadataReader {
    file: LocalFile,
    config: Config,
}

impl MetadataReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: LocalFile::existing(path),
            config: Config::default(),
        }
    }

    /// Reads from a host blob. A blob that is not on disk yet is copied into a
    /// temporary file which lives as long as the reader.
    pub fn from_blob(blob: &dyn Blob) -> Result<Self> {
        Ok(Self {
            file: LocalFile::materialize(blob)?,
            config: Config::default(),
        })
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads tags with the given tool.
    ///
    /// With no keys, every tag the tool reports is returned in the tool's order.
    /// With keys, the result holds exactly those keys, in the given order; a key
    /// the tool did not report maps to `""`.
    ///
    /// ImageMagick and GraphicsMagick use `identify -verbose` property names
    /// (`Format`, `Resolution`, `Channel depth:red`, plus `Width` and `Height`);
    /// ExifTool uses its own tag names, matched without regard to case.
    pub fn read_tags(&self, tool: Tool, keys: &[&str]) -> Result<MetadataMap> {
        let all = match tool {
            Tool::ExifTool => self.exiftool_tags(keys)?,
            Tool::ImageMagick | Tool::GraphicsMagick => self.identify(tool)?,
        };
        if keys.is_empty() {
            return Ok(all);
        }

        let mut result: MetadataMap = keys
            .iter()
            .map(|&key| (key, lookup(tool, &all, key)))
            .collect();

        if tool.is_magick() {
            apply_gif_resolution(&mut result, &all);
        }
        log::debug!(
            "read {} of {} tags from {} with {}",
            keys.len(),
            all.len(),
            self.path().display(),
            tool
        );
        Ok(result)
    }

    /// Value of a single tag, `""` when absent.
    pub fn read_one(&self, tool: Tool, key: &str) -> Result<String> {
        let tags = self.read_tags(tool, &[key])?;
        Ok(tags.get(key).unwrap_or_default().to_string())
    }

    /// Every tag as `key=value` lines, in the tool's order.
    pub fn read_all(&self, tool: Tool) -> Result<String> {
        Ok(self.read_tags(tool, &[])?.to_key_value_lines())
    }

    /// The embedded XMP packet, as ExifTool extracts it. Empty when the file
    /// has none.
    pub fn read_xmp(&self) -> Result<String> {
        ToolCommand::new(&self.config, Tool::ExifTool)
            .args(["-xmp", "-b"])
            .arg(self.path())
            .run()?
            .stdout_string()
    }

    /// Resolution in dots per inch, from ImageMagick's `Resolution` and `Units`.
    /// [`Dpi::UNKNOWN`] when the file declares no resolution.
    pub fn dpi(&self) -> Result<Dpi> {
        let tags = self.read_tags(Tool::ImageMagick, &[identify::RESOLUTION, identify::UNITS])?;
        Ok(Dpi::from_tool_strings(
            tags.get(identify::RESOLUTION).unwrap_or_default(),
            tags.get(identify::UNITS).unwrap_or_default(),
        ))
    }

    fn identify(&self, tool: Tool) -> Result<MetadataMap> {
        let output = ToolCommand::new(&self.config, tool)
            .arg("-verbose")
            .arg(self.path())
            .run()?;
        Ok(identify::parse_verbose(&output.stdout_lossy()))
    }

    /// `exiftool -s -TAG... file`, or `-All` when no tag is named. `-s` prints
    /// tag names (`ImageWidth`) instead of descriptions (`Image Width`).
    fn exiftool_tags(&self, keys: &[&str]) -> Result<MetadataMap> {
        let tag_args: Vec<String> = keys
            .iter()
            .filter(|key| !key.is_empty())
            .map(|key| format!("-{}", key))
            .collect();

        let mut command = ToolCommand::new(&self.config, Tool::ExifTool).arg("-s");
        command = if tag_args.is_empty() {
            command.arg("-All")
        } else {
            command.args(&tag_args)
        };
        let output = command.arg(self.path()).run()?;

        let mut tags = MetadataMap::new();
        for line in output.stdout_lossy().lines() {
            let line = TagLine::parse(line);
            if let Some(key) = line.key.filter(|key| !key.is_empty()) {
                tags.insert(key, line.value);
            }
        }
        Ok(tags)
    }
}

/// Finds `key` in the tool output.
///
/// ExifTool matches tag names without regard to case, and prints `XMP:Title`
/// as `Title`, so a group-qualified key falls back to its bare tag name.
/// `identify` names are matched exactly: `Properties:exif:Orientation` is a
/// nested entry of its own, not a group of `Orientation`.
fn lookup<'a>(tool: Tool, all: &'a MetadataMap, key: &str) -> &'a str {
    if key.is_empty() {
        return "";
    }
    match tool {
        Tool::ExifTool => all
            .get_ignore_case(key)
            .or_else(|| {
                key.rsplit_once(':')
                    .and_then(|(_, tag)| all.get_ignore_case(tag))
            })
            .unwrap_or_default(),
        Tool::ImageMagick | Tool::GraphicsMagick => all.get(key).unwrap_or_default(),
    }
}

/// GIF has no resolution field; report it as 72x72 when it was asked for.
fn apply_gif_resolution(result: &mut MetadataMap, all: &MetadataMap) {
    let resolution_missing = result
        .get(identify::RESOLUTION)
        .is_some_and(str::is_empty);
    let is_gif = all
        .get(identify::FORMAT)
        .is_some_and(identify::is_gif_format);
    if resolution_missing && is_gif {
        result.insert(identify::RESOLUTION, identify::GIF_RESOLUTION);
    }
}
