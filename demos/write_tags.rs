//! Concise example: Write tags on a copy, then read them back.
//!
//! Usage: `cargo run --example write_tags -- path/to/image.jpg`
use binmeta::{AssignOp, MetadataReader, MetadataWriter, TagAssignment, Tool};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: write_tags <file>");
        return Ok(());
    };

    let writer = MetadataWriter::new(&path);

    // 1. Set tags on a temporary copy, the source is left alone
    let copy = writer.write_properties(&[("Keywords", "A,B"), ("Title", "Beach")], true)?;
    println!("Working with temporary copy: {}", copy.path().display());

    // 2. Append to a list tag on the copy itself
    let copy_writer = MetadataWriter::new(copy.path());
    copy_writer.write_assignments(&[TagAssignment::new("Keywords", AssignOp::Append, "C")], false)?;

    let reader = MetadataReader::new(copy.path());
    let tags = reader.read_tags(Tool::ExifTool, &["Keywords", "Title"])?;
    print!("{}", tags.to_key_value_lines());

    // The copy is deleted here, when `copy` goes out of scope.
    Ok(())
}
