//! What the library needs from the host that stores the files.
//!
//! The host hands over a [`Blob`]. Tools only work on files, so a blob that is
//! not already on disk is copied into a temporary file for the duration of
//! the call ([`LocalFile`]).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempPath;

pub(crate) const TEMP_PREFIX: &str = "MDRW-";

/// Descriptive data the host keeps next to the bytes. It is not a tag of the
/// file and is never written by a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub encoding: Option<String>,
}

/// Binary content handed over by the host.
pub trait Blob {
    /// Path of the content when it already lives on the local file system.
    fn local_path(&self) -> Option<&Path>;

    /// Copies the content into `out`.
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()>;

    fn info(&self) -> BlobInfo;
}

/// A blob backed by a file on disk.
#[derive(Debug, Clone)]
pub struct FileBlob {
    path: PathBuf,
    info: BlobInfo,
}

impl FileBlob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Self {
            path,
            info: BlobInfo {
                filename,
                ..BlobInfo::default()
            },
        }
    }

    pub fn with_info(path: impl Into<PathBuf>, info: BlobInfo) -> Self {
        Self {
            path: path.into(),
            info,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Blob for FileBlob {
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

/// A blob held in memory.
#[derive(Debug, Clone)]
pub struct MemoryBlob {
    bytes: Vec<u8>,
    info: BlobInfo,
}

impl MemoryBlob {
    pub fn new(bytes: impl Into<Vec<u8>>, info: BlobInfo) -> Self {
        Self {
            bytes: bytes.into(),
            info,
        }
    }
}

impl Blob for MemoryBlob {
    fn local_path(&self) -> Option<&Path> {
        None
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(&self.bytes)
    }

    fn info(&self) -> BlobInfo {
        self.info.clone()
    }
}

/// A file a tool can be pointed at. Temporary copies are deleted on drop.
#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl LocalFile {
    pub fn existing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
        }
    }

    /// Copies a blob into a fresh temporary file unless it is already local.
    pub fn materialize(blob: &dyn Blob) -> Result<Self> {
        if let Some(path) = blob.local_path() {
            return Ok(Self::existing(path));
        }

        let suffix = extension_suffix(blob.info().filename.as_deref().map(Path::new));
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile()?;
        {
            let mut out = BufWriter::new(temp.as_file());
            blob.write_to(&mut out)?;
            out.flush()?;
        }
        let temp = temp.into_temp_path();
        log::debug!("materialized blob into {}", temp.display());
        Ok(Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// `.ext` of a file name, or an empty string. Keeping the extension on
/// temporary copies lets the tools recognise the format.
pub(crate) fn extension_suffix(path: Option<&Path>) -> String {
    path.and_then(Path::extension)
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Host hook that takes over files which must outlive the call that made them.
pub trait TempTracker {
    fn track(&self, path: &Path, owner: &str);
}

/// Files to delete when the registry is dropped or purged. Only a fallback
/// for files released from their scoped guard.
#[derive(Debug, Default)]
pub struct TempRegistry {
    paths: Mutex<Vec<(PathBuf, String)>>,
}

impl TempRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes every registered file that still exists.
    pub fn purge(&self) {
        for (path, owner) in self.lock().drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => log::debug!("removed {} (owner {})", path.display(), owner),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("could not remove {}: {}", path.display(), e),
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(PathBuf, String)>> {
        self.paths.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TempTracker for TempRegistry {
    fn track(&self, path: &Path, owner: &str) {
        self.lock().push((path.to_path_buf(), owner.to_string()));
    }
}

impl Drop for TempRegistry {
    fn drop(&mut self) {
        self.purge();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_local_blob_is_not_copied() -> Result<()> {
        let file = NamedTempFile::new()?;
        let blob = FileBlob::new(file.path());
        let local = LocalFile::materialize(&blob)?;
        assert_eq!(local.path(), file.path());
        assert!(!local.is_temporary());
        Ok(())
    }

    #[test]
    fn test_memory_blob_is_scoped() -> Result<()> {
        let blob = MemoryBlob::new(
            b"GIF89a".to_vec(),
            BlobInfo {
                filename: Some("logo.gif".to_string()),
                ..BlobInfo::default()
            },
        );
        let local = LocalFile::materialize(&blob)?;
        let path = local.path().to_path_buf();
        assert!(local.is_temporary());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("gif"));
        assert_eq!(fs::read(&path)?, b"GIF89a");

        drop(local);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_file_blob_info() {
        let blob = FileBlob::new("/data/photos/a.jpg");
        assert_eq!(blob.info().filename.as_deref(), Some("a.jpg"));
        assert_eq!(blob.info().mime_type, None);
    }

    #[test]
    fn test_registry_purges_on_drop() -> Result<()> {
        let (_, path) = NamedTempFile::new()?.keep().map_err(|e| e.error)?;
        let registry = TempRegistry::new();
        registry.track(&path, "test");
        assert_eq!(registry.len(), 1);

        drop(registry);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_registry_ignores_already_removed() -> Result<()> {
        let registry = TempRegistry::new();
        registry.track(Path::new("/nonexistent/MDRW-gone"), "test");
        registry.purge();
        assert!(registry.is_empty());
        Ok(())
    }

    #[test]
    fn test_extension_suffix() {
        assert_eq!(extension_suffix(Some(Path::new("a.tif"))), ".tif");
        assert_eq!(extension_suffix(Some(Path::new("noext"))), "");
        assert_eq!(extension_suffix(None), "");
    }
}
