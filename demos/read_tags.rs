//! Concise example: Read tags of a file with each installed tool.
//!
//! Usage: `cargo run --example read_tags -- path/to/image.jpg [Tag...]`
use binmeta::{is_tool_available, Config, MetadataError, MetadataReader, Tool};
use std::env;

fn main() -> Result<(), MetadataError> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: read_tags <file> [Tag...]");
        return Ok(());
    };
    let keys: Vec<String> = args.collect();
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

    let config = Config::default();
    let reader = MetadataReader::new(&path).with_config(config.clone());

    for tool in Tool::ALL {
        let availability = is_tool_available(&config, tool, false);
        if !availability.available {
            println!("--- {} not available: {}", tool, availability.reason);
            continue;
        }

        println!("--- {} ---", tool);
        let tags = reader.read_tags(tool, &keys)?;
        print!("{}", tags.to_key_value_lines());
    }

    // Resolution needs ImageMagick's Units.
    if is_tool_available(&config, Tool::ImageMagick, false).available {
        println!("DPI: {}", reader.dpi()?);
    }

    Ok(())
}
