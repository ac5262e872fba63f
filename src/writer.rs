use crate::blob::{extension_suffix, Blob, BlobInfo, FileBlob, LocalFile, TempTracker, TEMP_PREFIX};
use crate::config::Config;
use crate::error::{MetadataError, Result};
use crate::process::ToolCommand;
use crate::tool::Tool;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// How an assignment changes a tag. ExifTool gives the operator its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`: replace the value. An empty value deletes the tag.
    Set,
    /// `+=`: add an item to a list tag.
    Append,
    /// `-=`: remove an item from a list tag.
    Remove,
}

impl AssignOp {
    fn as_str(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Append => "+=",
            AssignOp::Remove => "-=",
        }
    }
}

/// A `TAG<op>VALUE` expression.
///
/// ```
/// use binmeta::{AssignOp, TagAssignment};
///
/// let kw = TagAssignment::new("Keywords", AssignOp::Append, "holiday");
/// assert_eq!(kw.to_string(), "Keywords+=holiday");
/// assert_eq!(TagAssignment::set("Title", "Beach").to_string(), "Title=Beach");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAssignment {
    pub tag: String,
    pub op: AssignOp,
    pub value: String,
}

impl TagAssignment {
    pub fn new(tag: impl Into<String>, op: AssignOp, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            op,
            value: value.into(),
        }
    }

    pub fn set(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(tag, AssignOp::Set, value)
    }
}

impl fmt::Display for TagAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tag, self.op.as_str(), self.value)
    }
}

/// The file a write ended up in.
///
/// When the write went to a copy, the copy is a temporary file deleted when
/// this value is dropped, unless [`WrittenFile::keep`] is called.
#[derive(Debug)]
pub struct WrittenFile {
    path: PathBuf,
    info: BlobInfo,
    temp: Option<TempPath>,
}

impl WrittenFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name, media type and encoding carried over from the source blob.
    pub fn info(&self) -> &BlobInfo {
        &self.info
    }

    pub fn is_copy(&self) -> bool {
        self.temp.is_some()
    }

    /// Releases the file from automatic deletion and returns its path.
    pub fn keep(self) -> Result<PathBuf> {
        match self.temp {
            Some(temp) => Ok(temp.keep().map_err(|e| e.error)?),
            None => Ok(self.path),
        }
    }

    /// Like [`WrittenFile::keep`], handing the copy to `tracker` so it is still
    /// removed eventually.
    pub fn keep_tracked(self, tracker: &dyn TempTracker, owner: &str) -> Result<PathBuf> {
        let is_copy = self.is_copy();
        let path = self.keep()?;
        if is_copy {
            tracker.track(&path, owner);
        }
        Ok(path)
    }
}

impl Blob for WrittenFile {
    fn local_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        let mut file = File::open(&self.path)?;
        io::copy(&mut file, out)?;
        Ok(())
    }

    fn info(&self) -> BlobInfo {
        self.info.clone()
    }
}

/// Writes tags into a file with ExifTool.
///
/// # Example
/// ```no_run
/// # use binmeta::{MetadataWriter, MetadataError};
/// # fn main() -> Result<(), MetadataError> {
/// let writer = MetadataWriter::new("data/a.jpg");
/// // Leaves data/a.jpg untouched and returns a modified temporary copy.
/// let copy = writer.write_tags(&["Keywords=holiday", "Title=Beach"], true)?;
/// println!("written to {}", copy.path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MetadataWriter {
    source: LocalFile,
    original: Option<BlobInfo>,
    config: Config,
}

impl MetadataWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            source: LocalFile::existing(path),
            original: None,
            config: Config::default(),
        }
    }

    /// Writes into a host blob. The blob's name, media type and encoding are
    /// carried over to every [`WrittenFile`].
    pub fn from_blob(blob: &dyn Blob) -> Result<Self> {
        Ok(Self {
            source: LocalFile::materialize(blob)?,
            original: Some(blob.info()),
            config: Config::default(),
        })
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    /// Applies `TAG<op>VALUE` expressions in a single ExifTool run, in order.
    ///
    /// With `work_on_copy` the source is copied to a temporary file first and
    /// only the copy is changed. A blob that had to be copied to disk to be
    /// read is always treated that way, since its temporary file goes away
    /// with the writer.
    pub fn write_tags(&self, assignments: &[&str], work_on_copy: bool) -> Result<WrittenFile> {
        if assignments.is_empty() {
            return Err(MetadataError::InvalidInput(
                "no tag assignment to write".to_string(),
            ));
        }
        let args = assignments
            .iter()
            .map(|expr| assignment_arg(expr))
            .collect::<Result<Vec<_>>>()?;

        let (path, temp) = if work_on_copy || self.source.is_temporary() {
            let temp = self.duplicate()?;
            (temp.to_path_buf(), Some(temp))
        } else {
            (self.source.path().to_path_buf(), None)
        };

        let mut command = ToolCommand::new(&self.config, Tool::ExifTool);
        if !self.config.keep_backup {
            command = command.arg("-overwrite_original");
        }
        let output = command.args(&args).arg(&path).run()?;
        log::debug!(
            "wrote {} tag(s) to {}: {}",
            args.len(),
            path.display(),
            output.stdout_lossy().trim()
        );

        let info = match &self.original {
            Some(info) => info.clone(),
            None => FileBlob::new(&path).info(),
        };
        Ok(WrittenFile { path, info, temp })
    }

    /// Writes `TAG=VALUE` for every pair.
    pub fn write_properties(&self, properties: &[(&str, &str)], work_on_copy: bool) -> Result<WrittenFile> {
        let expressions: Vec<String> = properties
            .iter()
            .map(|(tag, value)| TagAssignment::set(*tag, *value).to_string())
            .collect();
        self.write_expressions(&expressions, work_on_copy)
    }

    pub fn write_assignments(&self, assignments: &[TagAssignment], work_on_copy: bool) -> Result<WrittenFile> {
        let expressions: Vec<String> = assignments.iter().map(ToString::to_string).collect();
        self.write_expressions(&expressions, work_on_copy)
    }

    fn write_expressions(&self, expressions: &[String], work_on_copy: bool) -> Result<WrittenFile> {
        let refs: Vec<&str> = expressions.iter().map(String::as_str).collect();
        self.write_tags(&refs, work_on_copy)
    }

    /// Copies the source into a new temporary file with the same extension.
    fn duplicate(&self) -> Result<TempPath> {
        let suffix = extension_suffix(Some(self.source.path()));
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile()?
            .into_temp_path();
        fs::copy(self.source.path(), &temp)?;
        Ok(temp)
    }
}

/// ExifTool argument for one expression: `-` followed by the expression.
fn assignment_arg(expression: &str) -> Result<String> {
    let expression = expression.trim_start();
    if expression.trim().is_empty() || expression == "-" {
        return Err(MetadataError::InvalidInput(
            "empty tag assignment".to_string(),
        ));
    }
    Ok(if expression.starts_with('-') {
        expression.to_string()
    } else {
        format!("-{}", expression)
    })
}


#[cfg(all(test, unix))]
mod process_tests {
    use super::*;
    use crate::blob::{MemoryBlob, TempRegistry};
    use crate::process::test_support::fake_tool;
    use tempfile::{tempdir, TempDir};

    /// Fake exiftool appending its arguments to the last one (the file) and
    /// also recording them next to itself.
    fn fake_exiftool() -> (TempDir, Config) {
        let dir = tempdir().expect("tempdir");
        let args_file = dir.path().join("args.txt");
        let exiftool = fake_tool(
            dir.path(),
            "exiftool",
            &format!(
                "echo \"$*\" > '{}'\nfor last; do :; done\necho \"$*\" >> \"$last\"\necho '    1 image files updated'",
                args_file.display()
            ),
        );
        let config = Config {
            exiftool,
            timeout_secs: 10,
            ..Config::default()
        };
        (dir, config)
    }

    fn source_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("photo.jpg");
        fs::write(&path, "original\n").expect("write source");
        path
    }

    #[test]
    fn test_in_place() -> Result<()> {
        let (dir, config) = fake_exiftool();
        let source = source_file(&dir);
        let writer = MetadataWriter::new(&source).with_config(config);

        let written = writer.write_tags(&["Keywords=A,B", "Keywords+=C"], false)?;
        assert_eq!(written.path(), source);
        assert!(!written.is_copy());
        assert_eq!(written.info().filename.as_deref(), Some("photo.jpg"));

        let args = fs::read_to_string(dir.path().join("args.txt"))?;
        assert_eq!(
            args.trim(),
            format!("-overwrite_original -Keywords=A,B -Keywords+=C {}", source.display())
        );
        Ok(())
    }

    #[test]
    fn test_on_copy_leaves_source() -> Result<()> {
        let (dir, config) = fake_exiftool();
        let source = source_file(&dir);
        let writer = MetadataWriter::new(&source).with_config(config);

        let written = writer.write_tags(&["Title=Beach"], true)?;
        assert!(written.is_copy());
        assert_ne!(written.path(), source);
        assert_eq!(written.path().extension().and_then(|e| e.to_str()), Some("jpg"));
        assert_eq!(fs::read_to_string(&source)?, "original\n");
        assert!(fs::read_to_string(written.path())?.starts_with("original\n-overwrite_original -Title=Beach"));

        let copy = written.path().to_path_buf();
        drop(written);
        assert!(!copy.exists());
        Ok(())
    }

    #[test]
    fn test_keep_backup() -> Result<()> {
        let (dir, mut config) = fake_exiftool();
        config.keep_backup = true;
        let source = source_file(&dir);
        MetadataWriter::new(&source)
            .with_config(config)
            .write_tags(&["Title=x"], false)?;
        let args = fs::read_to_string(dir.path().join("args.txt"))?;
        assert!(!args.contains("-overwrite_original"));
        Ok(())
    }

    #[test]
    fn test_blob_info_is_carried_over() -> Result<()> {
        let (_dir, config) = fake_exiftool();
        let info = BlobInfo {
            filename: Some("scan.tif".to_string()),
            mime_type: Some("image/tiff".to_string()),
            encoding: None,
        };
        let blob = MemoryBlob::new(b"II*\0".to_vec(), info.clone());
        let writer = MetadataWriter::from_blob(&blob)?.with_config(config);

        // Not on disk: the result is a copy even when asked to write in place.
        let written = writer.write_properties(&[("Title", "Scan")], false)?;
        assert!(written.is_copy());
        assert_eq!(written.info(), &info);
        assert_ne!(written.path(), writer.path());
        Ok(())
    }

    #[test]
    fn test_keep_tracked() -> Result<()> {
        let (dir, config) = fake_exiftool();
        let source = source_file(&dir);
        let registry = TempRegistry::new();

        let written = MetadataWriter::new(&source)
            .with_config(config)
            .write_assignments(&[TagAssignment::set("Title", "x")], true)?;
        let kept = written.keep_tracked(&registry, "test_keep_tracked")?;
        assert!(kept.exists());
        assert_eq!(registry.len(), 1);

        registry.purge();
        assert!(!kept.exists());
        Ok(())
    }
}
