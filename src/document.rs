//! Copying metadata between files and the fields of a host document.
//!
//! A host document exposes its file content and its fields through the
//! [`Document`] trait, addressed by xpath-like names such as `file:content` or
//! `dc:description`.

use crate::blob::Blob;
use crate::config::Config;
use crate::error::{MetadataError, Result};
use crate::reader::MetadataReader;
use crate::tool::Tool;
use crate::writer::{MetadataWriter, WrittenFile};
use serde::{Deserialize, Serialize};

/// Field holding the main file of a document.
pub const DEFAULT_XPATH: &str = "file:content";

/// Tag name that asks for every tag, formatted as `key=value` lines.
pub const ALL_TAGS: &str = "all";

/// Declared type of a document field. Decides how a tag value is converted
/// before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Long,
    Float,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i32),
    Long(i64),
    Float(f64),
}

impl FieldType {
    /// Converts a tag value to this type. Integer types are rounded half up;
    /// a value that is not a number, or does not fit the type, becomes
    /// [`FieldValue::Null`].
    pub fn coerce(self, raw: &str) -> FieldValue {
        let number = || raw.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        let value = match self {
            FieldType::String => Some(FieldValue::String(raw.to_string())),
            FieldType::Integer => number()
                .and_then(to_i64)
                .and_then(|v| i32::try_from(v).ok())
                .map(FieldValue::Integer),
            FieldType::Long => number().and_then(to_i64).map(FieldValue::Long),
            FieldType::Float => number().map(FieldValue::Float),
        };
        value.unwrap_or(FieldValue::Null)
    }
}

/// Rounds half up; `None` outside the `i64` range.
fn to_i64(v: f64) -> Option<i64> {
    // 2^63 is exact in f64, unlike i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let rounded = (v + 0.5).floor();
    (-LIMIT..LIMIT).contains(&rounded).then_some(rounded as i64)
}

/// Stores tag `tag` into field `xpath`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub xpath: String,
    pub tag: String,
    #[serde(default)]
    pub field_type: FieldType,
}

impl FieldMapping {
    pub fn new(xpath: impl Into<String>, tag: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            xpath: xpath.into(),
            tag: tag.into(),
            field_type,
        }
    }

    fn wants_all(&self) -> bool {
        self.tag.eq_ignore_ascii_case(ALL_TAGS)
    }
}

/// A host document.
pub trait Document {
    /// Immutable documents (versions, proxies) are left alone.
    fn is_immutable(&self) -> bool;

    /// The file stored at `xpath`, if any. An xpath the document type does not
    /// have is an error.
    fn blob(&self, xpath: &str) -> Result<Option<Box<dyn Blob>>>;

    fn set_property(&mut self, xpath: &str, value: FieldValue) -> Result<()>;

    fn set_blob(&mut self, xpath: &str, file: WrittenFile) -> Result<()>;

    fn save(&mut self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub xpath: String,
    pub tool: Tool,
    pub fields: Vec<FieldMapping>,
    pub save: bool,
    pub config: Config,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            xpath: DEFAULT_XPATH.to_string(),
            tool: Tool::ImageMagick,
            fields: Vec::new(),
            save: true,
            config: Config::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub xpath: String,
    /// `(tag, value)` pairs, written as `TAG=VALUE`.
    pub properties: Vec<(String, String)>,
    pub save: bool,
    pub config: Config,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            xpath: DEFAULT_XPATH.to_string(),
            properties: Vec::new(),
            save: true,
            config: Config::default(),
        }
    }
}

/// Reads the tags named in `options.fields` from the document's file and
/// stores them in the mapped fields.
///
/// Does nothing when the document is immutable or has no file at `xpath`.
pub fn extract_metadata_into_document(doc: &mut dyn Document, options: &ExtractOptions) -> Result<()> {
    if options.fields.is_empty() {
        return Err(MetadataError::InvalidInput(
            "no field mapping given".to_string(),
        ));
    }
    if doc.is_immutable() {
        return Ok(());
    }
    let Some(blob) = doc.blob(&options.xpath)? else {
        return Ok(());
    };
    let reader = MetadataReader::from_blob(blob.as_ref())?.with_config(options.config.clone());

    let keys: Vec<&str> = options
        .fields
        .iter()
        .filter(|field| !field.wants_all())
        .map(|field| field.tag.as_str())
        .collect();
    let tags = if keys.is_empty() {
        None
    } else {
        Some(reader.read_tags(options.tool, &keys)?)
    };
    let all = if options.fields.iter().any(FieldMapping::wants_all) {
        Some(reader.read_all(options.tool)?)
    } else {
        None
    };

    for field in &options.fields {
        let value = if field.wants_all() {
            FieldValue::String(all.clone().unwrap_or_default())
        } else {
            let raw = tags
                .as_ref()
                .and_then(|tags| tags.get(&field.tag))
                .unwrap_or_default();
            field.field_type.coerce(raw)
        };
        doc.set_property(&field.xpath, value)?;
    }

    if options.save {
        doc.save()?;
    }
    Ok(())
}

/// Writes `options.properties` into the document's file in place and stores
/// the result back at `xpath`.
///
/// Does nothing when the document is immutable or has no file at `xpath`.
pub fn write_metadata_into_document(doc: &mut dyn Document, options: &WriteOptions) -> Result<()> {
    if options.properties.is_empty() {
        return Err(MetadataError::InvalidInput(
            "no property to write".to_string(),
        ));
    }
    if doc.is_immutable() {
        return Ok(());
    }
    let Some(blob) = doc.blob(&options.xpath)? else {
        return Ok(());
    };

    let writer = MetadataWriter::from_blob(blob.as_ref())?.with_config(options.config.clone());
    let properties: Vec<(&str, &str)> = options
        .properties
        .iter()
        .map(|(tag, value)| (tag.as_str(), value.as_str()))
        .collect();
    let written = writer.write_properties(&properties, false)?;
    doc.set_blob(&options.xpath, written)?;

    if options.save {
        doc.save()?;
    }
    Ok(())
}

/// The XMP packet of a blob, or an empty string when it has none or cannot
/// be read. Failures are logged, not returned.
pub fn extract_xmp(blob: &dyn Blob, config: &Config) -> String {
    let result = MetadataReader::from_blob(blob)
        .and_then(|reader| reader.with_config(config.clone()).read_xmp());
    match result {
        Ok(xmp) => xmp,
        Err(e) => {
            log::error!(
                "could not read XMP of {}: {}",
                blob.info().filename.as_deref().unwrap_or("<unnamed blob>"),
                e
            );
            String::new()
        }
    }
}
