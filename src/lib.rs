//! # binmeta
//!
//! Read and write the metadata of binary files (images, PDFs, office files)
//! through the ImageMagick, GraphicsMagick and ExifTool command-line tools.
//!
//! Every call spawns the tool once and waits for it, killing it when it runs
//! longer than the configured timeout. Files handed over as in-memory blobs
//! are copied to temporary files that are removed when the call is done.
//!
//! ## Reading
//!
//! ```no_run
//! use binmeta::{MetadataError, MetadataReader, Tool};
//!
//! fn main() -> Result<(), MetadataError> {
//!     let reader = MetadataReader::new("path/to/your/image.jpg");
//!
//!     // identify -verbose properties
//!     let tags = reader.read_tags(Tool::ImageMagick, &["Format", "Width", "Height"])?;
//!     println!("{}", tags.to_key_value_lines());
//!
//!     // ExifTool tags, matched case-insensitively
//!     let keywords = reader.read_one(Tool::ExifTool, "Keywords")?;
//!     println!("Keywords: {}", keywords);
//!
//!     // Resolution in dots per inch, 0x0 when the file declares none
//!     let dpi = reader.dpi()?;
//!     println!("DPI: {}", dpi);
//!     Ok(())
//! }
//! ```
//!
//! ## Writing
//!
//! ```no_run
//! use binmeta::{MetadataError, MetadataWriter, TagAssignment, AssignOp};
//!
//! fn main() -> Result<(), MetadataError> {
//!     let writer = MetadataWriter::new("path/to/your/image.jpg");
//!
//!     // Work on a temporary copy, the source stays untouched.
//!     let copy = writer.write_tags(&["Keywords=A,B", "Title=Beach"], true)?;
//!     println!("written to {}", copy.path().display());
//!
//!     // Append in place.
//!     writer.write_assignments(&[TagAssignment::new("Keywords", AssignOp::Append, "C")], false)?;
//!
//!     // The copy is deleted when `copy` is dropped unless it is kept.
//!     let kept = copy.keep()?;
//!     println!("kept {}", kept.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Executable locations and the timeout come from [`Config`], which can be
//! loaded from a JSON file:
//!
//! ```no_run
//! use binmeta::{is_tool_available, Config, MetadataError, Tool};
//! use std::path::Path;
//!
//! fn main() -> Result<(), MetadataError> {
//!     let config = Config::load(Path::new("binmeta.json"))?;
//!     let exiftool = is_tool_available(&config, Tool::ExifTool, false);
//!     if !exiftool.available {
//!         eprintln!("exiftool missing: {}", exiftool.reason);
//!     }
//!     Ok(())
//! }
//! ```

// Public API
mod error;
mod process;

pub mod availability;
pub mod blob;
pub mod config;
pub mod document;
pub mod identify;
pub mod metadata;
pub mod reader;
pub mod resolution;
pub mod tag_line;
pub mod tool;
pub mod writer;

pub use availability::{is_tool_available, Availability, AvailabilityCache};
pub use blob::{Blob, BlobInfo, FileBlob, LocalFile, MemoryBlob, TempRegistry, TempTracker};
pub use config::Config;
pub use document::{
    extract_metadata_into_document, extract_xmp, write_metadata_into_document, Document,
    ExtractOptions, FieldMapping, FieldType, FieldValue, WriteOptions,
};
pub use error::{MetadataError, Result};
pub use metadata::MetadataMap;
pub use reader::MetadataReader;
pub use resolution::{Dpi, Resolution, ResolutionUnit};
pub use tag_line::TagLine;
pub use tool::Tool;
pub use writer::{AssignOp, MetadataWriter, TagAssignment, WrittenFile};
