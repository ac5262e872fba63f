//! Runs the real tools on images generated on the fly. A test returns early
//! when the tool it needs is not installed.

use binmeta::{
    is_tool_available, AssignOp, Config, MetadataReader, MetadataWriter, Result,
    TagAssignment, Tool,
};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn installed(tool: Tool) -> bool {
    init_logger();
    let availability = is_tool_available(&Config::default(), tool, false);
    if !availability.available {
        log::warn!("skipping, {} not installed: {}", tool, availability.reason);
    }
    availability.available
}

fn generate(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    image.save(&path).expect("Failed to write test image");
    path
}

fn scratch() -> TempDir {
    tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_magick_dimensions_of_png() -> Result<()> {
    if !installed(Tool::ImageMagick) {
        return Ok(());
    }
    let dir = scratch();
    let png = generate(dir.path(), "a.png", 456, 180);

    let tags = MetadataReader::new(&png).read_tags(Tool::ImageMagick, &["Format", "Width", "Height"])?;
    assert!(tags.get("Format").unwrap_or_default().starts_with("PNG"));
    assert_eq!(tags.get("Width"), Some("456"));
    assert_eq!(tags.get("Height"), Some("180"));
    Ok(())
}

#[test]
fn test_graphicsmagick_dimensions_of_png() -> Result<()> {
    if !installed(Tool::GraphicsMagick) {
        return Ok(());
    }
    let dir = scratch();
    let png = generate(dir.path(), "a.png", 64, 32);

    let tags = MetadataReader::new(&png).read_tags(Tool::GraphicsMagick, &["Width", "Height"])?;
    assert_eq!(tags.get("Width"), Some("64"));
    assert_eq!(tags.get("Height"), Some("32"));
    Ok(())
}

#[test]
fn test_gif_reports_72_dpi() -> Result<()> {
    if !installed(Tool::ImageMagick) {
        return Ok(());
    }
    let dir = scratch();
    let gif = generate(dir.path(), "a.gif", 16, 16);

    let tags = MetadataReader::new(&gif).read_tags(Tool::ImageMagick, &["Resolution"])?;
    assert_eq!(tags.get("Resolution"), Some("72x72"));
    Ok(())
}

#[test]
fn test_requested_keys_are_all_present() -> Result<()> {
    if !installed(Tool::ExifTool) {
        return Ok(());
    }
    let dir = scratch();
    let png = generate(dir.path(), "a.png", 20, 10);

    let keys = ["imagewidth", "FileType", "NOT_VALID_PROPERTY", ""];
    let tags = MetadataReader::new(&png).read_tags(Tool::ExifTool, &keys)?;
    assert_eq!(tags.keys().collect::<Vec<_>>(), keys);
    assert_eq!(tags.get("imagewidth"), Some("20"));
    assert_eq!(tags.get("FileType"), Some("PNG"));
    assert_eq!(tags.get("NOT_VALID_PROPERTY"), Some(""));
    assert_eq!(tags.get(""), Some(""));
    Ok(())
}

#[test]
fn test_png_without_xmp() -> Result<()> {
    if !installed(Tool::ExifTool) {
        return Ok(());
    }
    let dir = scratch();
    let png = generate(dir.path(), "a.png", 8, 8);
    assert_eq!(MetadataReader::new(&png).read_xmp()?, "");
    Ok(())
}

#[test]
fn test_keywords_on_copy_then_append_in_place() -> Result<()> {
    if !installed(Tool::ExifTool) {
        return Ok(());
    }
    let dir = scratch();
    let jpg = generate(dir.path(), "a.jpg", 32, 32);

    let copy = MetadataWriter::new(&jpg).write_tags(&["Keywords=A,B"], true)?;
    assert_ne!(copy.path(), jpg);
    assert_eq!(MetadataReader::new(&jpg).read_one(Tool::ExifTool, "Keywords")?, "");

    MetadataWriter::new(copy.path()).write_assignments(
        &[TagAssignment::new("Keywords", AssignOp::Append, "C")],
        false,
    )?;
    let keywords = MetadataReader::new(copy.path()).read_one(Tool::ExifTool, "Keywords")?;
    assert_eq!(keywords, "A,B, C");

    let copy_path = copy.path().to_path_buf();
    drop(copy);
    assert!(!copy_path.exists());
    Ok(())
}

#[test]
fn test_no_backup_left_behind() -> Result<()> {
    if !installed(Tool::ExifTool) {
        return Ok(());
    }
    let dir = scratch();
    let jpg = generate(dir.path(), "a.jpg", 16, 16);

    MetadataWriter::new(&jpg).write_properties(&[("Title", "Beach")], false)?;
    assert_eq!(MetadataReader::new(&jpg).read_one(Tool::ExifTool, "Title")?, "Beach");
    assert!(!dir.path().join("a.jpg_original").exists());
    Ok(())
}
